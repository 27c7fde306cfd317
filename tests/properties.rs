use assert_approx_eq::assert_approx_eq;
use dense_la::{
    linalg::{chain::optimal_order, cholesky::Cholesky, det, qr::Qr},
    mat,
    mat::{equal_approx, Footprint, Overlap},
    reborrow::*,
    vector, Dense, Matrix, MatrixMut, SymDense, TriDense, VecDense,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn random(rng: &mut StdRng, m: usize, n: usize) -> Dense {
    Dense::from_fn(m, n, |_, _| rng.gen::<f64>() * 2.0 - 1.0)
}

#[test]
fn add_then_sub_round_trips() {
    let mut rng = StdRng::seed_from_u64(1);
    for (m, n) in [(1, 1), (3, 5), (7, 2)] {
        let a = random(&mut rng, m, n);
        let b = random(&mut rng, m, n);
        let mut sum = Dense::new();
        sum.add(&a, &b);
        let mut back = Dense::new();
        back.sub(&sum, &b);
        assert!(equal_approx(&back, &a, 1e-15));
    }
}

#[test]
fn lu_inverse_property() {
    let mut rng = StdRng::seed_from_u64(2);
    for n in [1, 2, 5, 12] {
        // diagonally dominant, hence well conditioned
        let mut a = random(&mut rng, n, n);
        for i in 0..n {
            a.set(i, i, a.at(i, i) + n as f64);
        }
        let mut inv = Dense::new();
        inv.inverse(&a).unwrap();
        let mut prod = Dense::new();
        prod.mul(&a, &inv);
        assert!(equal_approx(&prod, &Dense::identity(n), 1e-12));
    }
}

#[test]
fn cholesky_reconstructs() {
    let mut rng = StdRng::seed_from_u64(3);
    for n in [1, 4, 9] {
        let b = random(&mut rng, n, n);
        let mut bbt = Dense::new();
        bbt.mul(&b, &b.t());
        let a = SymDense::from_fn(n, |i, j| bbt.at(i, j) + if i == j { 1.0 } else { 0.0 });

        let mut chol = Cholesky::new();
        chol.factorize(&a).unwrap();
        let mut l = TriDense::new();
        chol.l_to(&mut l);
        let mut llt = Dense::new();
        llt.mul(&l, &l.t());
        assert!(equal_approx(&llt, &a, 1e-12));
    }
}

#[test]
fn cholesky_known_matrix() {
    let a = SymDense::from_vec(3, vec![4.0, 1.0, 1.0, 1.0, 2.0, 3.0, 1.0, 3.0, 6.0]);
    let mut chol = Cholesky::new();
    chol.factorize(&a).unwrap();

    let mut l = TriDense::new();
    chol.l_to(&mut l);
    let expected = [
        [2.0, 0.0, 0.0],
        [0.5, 1.322876, 0.0],
        [0.5, 2.078805, 1.195229],
    ];
    for i in 0..3 {
        for j in 0..3 {
            assert_approx_eq!(l.at(i, j), expected[i][j], 1e-6);
        }
    }
    assert_approx_eq!(chol.det(), 10.0, 1e-12);
    assert_approx_eq!(det(&a), 10.0, 1e-12);

    let b = vector![1.0, 2.0, 3.0];
    let mut x = VecDense::new();
    chol.solve_vec_to(&mut x, &b).unwrap();
    let mut ax = VecDense::new();
    ax.mul_vec(&a, &x);
    assert!(equal_approx(&ax, &b, 1e-12));
}

#[test]
fn qr_is_orthogonal_and_reconstructs() {
    let mut rng = StdRng::seed_from_u64(4);
    for (m, n) in [(1, 1), (4, 4), (9, 3), (6, 5)] {
        let a = random(&mut rng, m, n);
        let mut qr = Qr::new();
        qr.factorize(&a);
        let mut q = Dense::new();
        let mut r = Dense::new();
        qr.q_to(&mut q);
        qr.r_to(&mut r);

        let mut qr_prod = Dense::new();
        qr_prod.mul(&q, &r);
        assert!(equal_approx(&qr_prod, &a, 1e-12));

        let mut qtq = Dense::new();
        qtq.mul(&q.t(), &q);
        assert!(equal_approx(&qtq, &Dense::identity(m), 1e-12));
    }
}

fn brute_force_cost(dims: &[usize]) -> usize {
    if dims.len() <= 2 {
        return 0;
    }
    let k = dims.len() - 1;
    (1..k)
        .map(|s| {
            brute_force_cost(&dims[..=s])
                + brute_force_cost(&dims[s..])
                + dims[0] * dims[s] * dims[k]
        })
        .min()
        .unwrap()
}

#[test]
fn chain_order_is_optimal() {
    let mut rng = StdRng::seed_from_u64(5);
    for k in 1..=6 {
        for _ in 0..20 {
            let dims: Vec<usize> = (0..=k).map(|_| rng.gen_range(1..40)).collect();
            assert!(optimal_order(&dims).cost() == brute_force_cost(&dims));
        }
    }
}

#[test]
fn chain_product_matches_naive_product() {
    let mut rng = StdRng::seed_from_u64(6);
    for k in 1..=6 {
        let dims: Vec<usize> = (0..=k).map(|_| rng.gen_range(1..8)).collect();
        // small integers keep every product exact, whatever the evaluation order
        let mats: Vec<Dense> = dims
            .windows(2)
            .map(|d| Dense::from_fn(d[0], d[1], |_, _| rng.gen_range(-3i32..=3) as f64))
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
        assert!(equal_approx(&p, &naive, 1e-14));
    }
}

fn elements(offset: usize, (m, n): (usize, usize), (rs, cs): (usize, usize)) -> Vec<usize> {
    let mut out = Vec::new();
    for i in 0..m {
        for j in 0..n {
            out.push(offset + i * rs + j * cs);
        }
    }
    out
}

#[test]
fn overlap_detection_is_sound() {
    let buf = vec![0.0f64; 256];
    let base = buf.as_ptr();
    let shapes = [(1, 1), (1, 4), (3, 1), (2, 3), (3, 3)];
    let strides = [(4, 1), (6, 1), (1, 5)];
    let offsets = [0, 1, 3, 4, 9, 17];

    for &sa in &shapes {
        for &sb in &shapes {
            for &ta in &strides {
                for &tb in &strides {
                    for &oa in &offsets {
                        for &ob in &offsets {
                            let fa = Footprint::new(base.wrapping_add(oa), sa.0, sa.1, ta.0, ta.1);
                            let fb = Footprint::new(base.wrapping_add(ob), sb.0, sb.1, tb.0, tb.1);
                            let ea = elements(oa, sa, ta);
                            let eb = elements(ob, sb, tb);
                            let shared = ea.iter().any(|x| eb.contains(x));
                            let overlap = fa.classify(&fb);
                            // row-major views with a common row stride are classified exactly
                            if ta == tb && ta.1 == 1 {
                                assert_eq!(
                                    overlap == Overlap::Disjoint,
                                    !shared,
                                    "{sa:?}@{oa} vs {sb:?}@{ob}, strides {ta:?}"
                                );
                            }
                            match overlap {
                                Overlap::Disjoint => assert!(!shared),
                                Overlap::Identical => {
                                    let mut sa_sorted = ea.clone();
                                    let mut sb_sorted = eb.clone();
                                    sa_sorted.sort_unstable();
                                    sb_sorted.sort_unstable();
                                    assert!(sa_sorted == sb_sorted);
                                }
                                Overlap::Partial => {}
                            }
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn overlap_detection_separates_row_blocks() {
    let mut a = Dense::zeros(6, 4);
    let (top, bottom) = a.as_mut().split_at_row_mut(3);
    assert!(top.rb().footprint().classify(&bottom.rb().footprint()) == Overlap::Disjoint);
}

#[test]
fn mul_grows_empty_receiver() {
    let id = Dense::identity(4);
    let mut c = Dense::new();
    c.mul(&id, &id);
    assert!(c == Dense::identity(4));

    let mut z = Dense::zeros(4, 4);
    z.mul(&id, &id);
    assert!(z == Dense::identity(4));
}

#[test]
fn small_system() {
    let a = mat![[2.0, 1.0], [1.0, 3.0]];
    let b = mat![[3.0], [5.0]];
    let mut x = Dense::new();
    x.solve(&a, &b).unwrap();
    assert_approx_eq!(x.at(0, 0), 0.8, 1e-12);
    assert_approx_eq!(x.at(1, 0), 1.4, 1e-12);
}
