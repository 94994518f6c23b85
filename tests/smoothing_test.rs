//! Smoothing behaviour across kernels, history and eye aspect ratios


use gesture_pointer::{
    constants::{EAR_AVG_SLOT, EAR_LEFT_SLOT, EAR_RIGHT_SLOT, N_SHAPES},
    detector::{DetectionResult, Landmark},
    smoothing::{eye_aspect_ratios, KernelProfile, SignalSmoother, SmoothingKernel},
    Error,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use test_helpers::{assert_close, face_mesh, face_result, scores};

#[test]
fn test_constant_history_converges_for_any_kernel() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..20 {
        let len = rng.gen_range(1..=12);
        let weights: Vec<f64> = (0..len).map(|_| rng.gen_range(0.01..5.0)).collect();
        let kernel = SmoothingKernel::new(weights, 100).unwrap();
        let mut smoother = SignalSmoother::new(kernel, 100).unwrap();

        let constant = rng.gen_range(0.0..1.0);
        let raw = vec![constant; N_SHAPES];
        let mesh = face_mesh(0.1, (0.5, 0.5));
        for _ in 0..len {
            smoother.push(&raw, &mesh).unwrap();
        }

        let signal = smoother.latest().unwrap();
        for i in (0..N_SHAPES).filter(|i| ![EAR_RIGHT_SLOT, EAR_LEFT_SLOT, EAR_AVG_SLOT].contains(i)) {
            assert_close(signal[i], constant, 1e-9);
        }
    }
}

#[test]
fn test_two_tap_scenario() {
    let kernel = SmoothingKernel::new(vec![0.5, 0.5], 100).unwrap();
    let mut smoother = SignalSmoother::new(kernel, 100).unwrap();

    let first = smoother.observe(&face_result(1, &[("neutral", 0.2)])).unwrap()[0];
    // unfilled history counts as zero
    assert_close(first, 0.1, 1e-12);

    let second = smoother.observe(&face_result(2, &[("neutral", 0.8)])).unwrap()[0];
    assert_close(second, 0.5, 1e-12);
}

#[test]
fn test_newest_frame_gets_last_weight() {
    let kernel = SmoothingKernel::new(vec![1.0, 3.0], 10).unwrap();
    let mut smoother = SignalSmoother::new(kernel, 10).unwrap();
    smoother.observe(&face_result(1, &[("jaw_open", 1.0)]));
    let value = smoother.observe(&face_result(2, &[("jaw_open", 0.0)])).unwrap()[25];
    assert_close(value, 0.25, 1e-12);
}

#[test]
fn test_history_keeps_most_recent_frames() {
    let kernel = SmoothingKernel::from_profile(3, KernelProfile::Uniform, 5).unwrap();
    let mut smoother = SignalSmoother::new(kernel, 5).unwrap();

    for i in 0..12_u32 {
        let value = f64::from(i) / 100.0;
        smoother.push(&scores(&[("neutral", value)]), &[]).unwrap();
        assert!(smoother.history().len() <= 5);
    }

    let firsts: Vec<f64> = smoother.history().iter().map(|frame| frame[0]).collect();
    assert_eq!(firsts, vec![0.07, 0.08, 0.09, 0.10, 0.11]);
}

#[test]
fn test_no_face_freezes_signal() {
    let kernel = SmoothingKernel::new(vec![1.0], 10).unwrap();
    let mut smoother = SignalSmoother::new(kernel, 10).unwrap();

    assert!(smoother.observe(&DetectionResult::empty(1)).is_none());
    let before = smoother.observe(&face_result(2, &[("cheek_puff", 0.6)])).cloned().unwrap();
    for ts in 3..10 {
        let during = smoother.observe(&DetectionResult::empty(ts)).unwrap();
        assert_eq!(during, &before);
    }
    assert_eq!(smoother.history().len(), 1);
}

#[test]
fn test_ear_bounds_for_random_landmarks() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..200 {
        let mesh: Vec<Landmark> = (0..478)
            .map(|_| Landmark::new(rng.gen_range(-1.0..2.0), rng.gen_range(-1.0..2.0), rng.gen_range(-1.0..1.0)))
            .collect();
        let ears = eye_aspect_ratios(&mesh);
        for value in [ears.right, ears.left, ears.average] {
            assert!((0.0..=1.0).contains(&value), "EAR out of range: {value}");
        }
    }
}

#[test]
fn test_ear_overrides_blink_slots() {
    let kernel = SmoothingKernel::new(vec![1.0], 10).unwrap();
    let mut smoother = SignalSmoother::new(kernel, 10).unwrap();

    // blendshape output says fully blinking; geometry says eyes are closed
    let raw = scores(&[("eye_blink_right", 0.9), ("eye_blink_left", 0.9), ("eye_blink", 0.9)]);
    let signal = smoother.push(&raw, &face_mesh(0.0, (0.5, 0.5))).unwrap();
    assert_close(signal[EAR_RIGHT_SLOT], 1.0, 1e-12);
    assert_close(signal[EAR_LEFT_SLOT], 1.0, 1e-12);
    assert_close(signal[EAR_AVG_SLOT], 1.0, 1e-12);

    // wide open eyes clamp at zero
    let signal = smoother.push(&raw, &face_mesh(0.3, (0.5, 0.5))).unwrap();
    assert_eq!(signal[EAR_RIGHT_SLOT], 0.0);
    assert_eq!(signal[EAR_AVG_SLOT], 0.0);
}

#[test]
fn test_half_closed_eye() {
    // vertical 0.05 over horizontal 0.3: 1 - 3 * 0.05 / 0.3 = 0.5
    let ears = eye_aspect_ratios(&face_mesh(0.05, (0.5, 0.5)));
    assert_close(ears.right, 0.5, 1e-9);
    assert_close(ears.left, 0.5, 1e-9);
    assert_close(ears.average, 0.5, 1e-9);
}

#[test]
fn test_kernel_load_errors() {
    assert!(matches!(SmoothingKernel::new(vec![], 10), Err(Error::InvalidKernel(_))));
    assert!(matches!(SmoothingKernel::new(vec![0.0, 0.0], 10), Err(Error::InvalidKernel(_))));
    assert!(matches!(SmoothingKernel::new(vec![1.0, -0.5], 10), Err(Error::InvalidKernel(_))));
    assert!(matches!(SmoothingKernel::new(vec![f64::NAN], 10), Err(Error::InvalidKernel(_))));
    assert!(matches!(SmoothingKernel::new(vec![1.0; 11], 10), Err(Error::InvalidKernel(_))));
    assert!(SmoothingKernel::new(vec![1.0; 10], 10).unwrap().weights().iter().all(|w| (*w - 0.1).abs() < 1e-12));
}
