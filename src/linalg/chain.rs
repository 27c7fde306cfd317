//! Products of chains of matrices.
//!
//! The cost of multiplying a chain of matrices depends heavily on the order in which the
//! products are evaluated. [`optimal_order`] finds the order minimizing the number of scalar
//! multiplications with the classic `O(k³)` dynamic program over the `k + 1` boundary
//! dimensions of the chain, and [`Dense::product`] evaluates a chain in that order.
//!
//! ```
//! use dense_la::linalg::chain::optimal_order;
//!
//! // (10 × 100) (100 × 5) (5 × 50)
//! let plan = optimal_order(&[10, 100, 5, 50]);
//! assert_eq!(plan.cost(), 10 * 100 * 5 + 10 * 5 * 50);
//! assert_eq!(plan.parenthesize(), "((A0 A1) A2)");
//! ```

use crate::{
    assert,
    error::{fail, MatError},
    Dense, Engine, Matrix,
};
use core::fmt::Write;

/// Evaluation order of a matrix chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainPlan {
    k: usize,
    cost: usize,
    // split[i * k + j] is the last factor of the left operand of the product of factors i..=j
    split: Vec<usize>,
}

impl ChainPlan {
    /// Returns the number of factors of the chain.
    #[inline]
    pub fn len(&self) -> usize {
        self.k
    }

    /// Returns `true` if the chain has no factors.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.k == 0
    }

    /// Returns the number of scalar multiplications of the optimal order, saturated at
    /// `usize::MAX`.
    #[inline]
    pub fn cost(&self) -> usize {
        self.cost
    }

    /// Returns the index `s` such that the product of the factors `i..=j` is best computed as
    /// `(A_i ⋯ A_s) (A_{s+1} ⋯ A_j)`.
    ///
    /// # Panics
    /// Panics unless `i < j < self.len()`.
    #[track_caller]
    #[inline]
    pub fn split(&self, i: usize, j: usize) -> usize {
        assert!(all(i < j, j < self.k));
        self.split[i * self.k + j]
    }

    /// Returns the optimal order as a fully parenthesized expression, with the factors named
    /// `A0`, `A1`, ...
    pub fn parenthesize(&self) -> String {
        let mut out = String::new();
        if self.k > 0 {
            self.write_range(&mut out, 0, self.k - 1);
        }
        out
    }

    fn write_range(&self, out: &mut String, i: usize, j: usize) {
        if i == j {
            let _ = write!(out, "A{i}");
            return;
        }
        let s = self.split(i, j);
        out.push('(');
        self.write_range(out, i, s);
        out.push(' ');
        self.write_range(out, s + 1, j);
        out.push(')');
    }
}

/// Computes the optimal evaluation order of the chain of `dims.len() - 1` matrices, where factor
/// `i` has dimensions `dims[i] × dims[i + 1]`.
///
/// Among orders of equal cost, the one splitting the chain the furthest to the left is chosen.
pub fn optimal_order(dims: &[usize]) -> ChainPlan {
    let k = dims.len().saturating_sub(1);
    let mut cost = vec![0usize; k * k];
    let mut split = vec![0usize; k * k];

    for len in 2..=k {
        for i in 0..=k - len {
            let j = i + len - 1;
            let mut best = usize::MAX;
            let mut best_split = i;
            for s in i..j {
                let c = cost[i * k + s]
                    .saturating_add(cost[(s + 1) * k + j])
                    .saturating_add(dims[i].saturating_mul(dims[s + 1]).saturating_mul(dims[j + 1]));
                if c < best {
                    best = c;
                    best_split = s;
                }
            }
            cost[i * k + j] = best;
            split[i * k + j] = best_split;
        }
    }

    ChainPlan {
        k,
        cost: if k == 0 { 0 } else { cost[k - 1] },
        split,
    }
}

enum Operand {
    Leaf(usize),
    Temp(Dense),
}

impl Operand {
    #[inline]
    fn get<'a>(&'a self, factors: &'a [&'a dyn Matrix]) -> &'a dyn Matrix {
        match self {
            Operand::Leaf(i) => factors[*i],
            Operand::Temp(m) => m,
        }
    }
}

fn eval(engine: Engine, plan: &ChainPlan, factors: &[&dyn Matrix], i: usize, j: usize) -> Operand {
    if i == j {
        return Operand::Leaf(i);
    }
    let s = plan.split(i, j);
    let lhs = eval(engine, plan, factors, i, s);
    let rhs = eval(engine, plan, factors, s + 1, j);
    let mut out = Dense::new();
    out.mul_with(engine, lhs.get(factors), rhs.get(factors));
    Operand::Temp(out)
}

impl Dense {
    /// Sets the receiver to the product of `factors`, evaluated in the order minimizing the
    /// number of scalar multiplications.
    ///
    /// # Panics
    /// Panics with [`MatError::ZeroLength`] if `factors` is empty or a factor has a zero
    /// dimension, and panics if the dimensions of two adjacent factors are not compatible, or
    /// if the receiver is not empty and does not have the shape of the product.
    #[track_caller]
    pub fn product(&mut self, factors: &[&dyn Matrix]) {
        self.product_with(Engine::default(), factors)
    }

    /// Same as [`Dense::product`], running general products on the backend of `engine`.
    #[track_caller]
    pub fn product_with(&mut self, engine: Engine, factors: &[&dyn Matrix]) {
        let k = factors.len();
        if k == 0 {
            fail(MatError::ZeroLength);
        }
        let mut dims = Vec::with_capacity(k + 1);
        dims.push(factors[0].dims().0);
        for (i, f) in factors.iter().enumerate() {
            let (r, c) = f.dims();
            if r == 0 || c == 0 {
                fail(MatError::ZeroLength);
            }
            let prev_cols = dims[i];
            assert!(r == prev_cols);
            dims.push(c);
        }

        let plan = optimal_order(&dims);
        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "chain: {k} factors, {} scalar multiplications, order {}",
                plan.cost(),
                plan.parenthesize()
            );
        }

        if k == 1 {
            self.reuse_as(dims[0], dims[1]);
            self.as_mut().copy_from_matrix(factors[0]);
            return;
        }
        let s = plan.split(0, k - 1);
        let lhs = eval(engine, &plan, factors, 0, s);
        let rhs = eval(engine, &plan, factors, s + 1, k - 1);
        self.mul_with(engine, lhs.get(factors), rhs.get(factors));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn textbook_chain() {
        let plan = optimal_order(&[30, 35, 15, 5, 10, 20, 25]);
        assert!(plan.len() == 6);
        assert!(plan.cost() == 15125);
        assert!(plan.parenthesize() == "((A0 (A1 A2)) ((A3 A4) A5))");
    }

    #[test]
    fn degenerate_chains() {
        assert!(optimal_order(&[]).is_empty());
        let one = optimal_order(&[4, 7]);
        assert!(all(one.len() == 1, one.cost() == 0));
        assert!(one.parenthesize() == "A0");
        let huge = optimal_order(&[usize::MAX, usize::MAX, usize::MAX]);
        assert!(huge.cost() == usize::MAX);
    }

    #[test]
    fn equal_costs_split_left() {
        // every order costs 8
        let plan = optimal_order(&[2, 2, 2]);
        assert!(plan.split(0, 1) == 0);
        let plan = optimal_order(&[1, 1, 1, 1]);
        assert!(plan.parenthesize() == "(A0 (A1 A2))");
    }

    #[test]
    fn product_matches_naive_order() {
        let mut rng = StdRng::seed_from_u64(0);
        let dims = [3, 9, 2, 7, 1, 5];
        let mats: Vec<Dense> = dims
            .windows(2)
            .map(|d| Dense::from_fn(d[0], d[1], |_, _| rng.gen_range(-4i32..=4) as f64))
            .collect();
        let factors: Vec<&dyn Matrix> = mats.iter().map(|m| m as &dyn Matrix).collect();

        let mut naive = mats[0].clone();
        for m in &mats[1..] {
            let mut next = Dense::new();
            next.mul(&naive, m);
            naive = next;
        }

        let mut p = Dense::new();
        p.product(&factors);
        assert!(p.dims() == (3, 5));
        assert!(p == naive);

        let mut q = Dense::new();
        q.product_with(Engine::REFERENCE, &factors);
        assert!(q == naive);
    }

    #[test]
    fn single_factor_is_copied() {
        let a = crate::mat![[1.0, 2.0]];
        let at = a.t();
        let mut p = Dense::new();
        p.product(&[&at as &dyn Matrix]);
        assert!(p == crate::mat![[1.0], [2.0]]);
    }

    #[test]
    #[should_panic]
    fn incompatible_factors_panic() {
        let a = Dense::zeros(2, 3);
        let b = Dense::zeros(2, 3);
        Dense::new().product(&[&a as &dyn Matrix, &b]);
    }

    #[test]
    #[should_panic(expected = "matrix: zero length")]
    fn empty_chain_panics() {
        Dense::new().product(&[]);
    }
}
