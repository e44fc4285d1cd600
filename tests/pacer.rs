mod tests {
    use core::sync::atomic::AtomicBool;

    use embassy_time::{Duration, Instant};
    use lightbox_core::pacer::{ADAPTIVE_WINDOW, FramePacer, PacerConfig, PrecisionSleeper};

    fn config(target_fps: u32, min_fps: u32, max_fps: u32, adaptive: bool) -> PacerConfig {
        PacerConfig {
            target_fps,
            min_fps,
            max_fps,
            adaptive,
        }
    }

    #[test]
    fn test_sleep_fills_the_interval() {
        let mut pacer = FramePacer::new(config(50, 10, 120, false));
        assert_eq!(pacer.target_interval(), Duration::from_millis(20));

        let plan = pacer.plan(Duration::from_millis(5));
        assert_eq!(plan.sleep, Duration::from_millis(15));
        assert!(!plan.late);

        let plan = pacer.plan(Duration::from_millis(25));
        assert_eq!(plan.sleep, Duration::from_ticks(0));
        assert!(plan.late);
        assert_eq!(plan.adjustment, None);
    }

    #[test]
    fn test_overruns_lower_fps_down_to_floor() {
        let mut pacer = FramePacer::new(config(60, 50, 120, true));
        let slow = Duration::from_millis(30);

        for _ in 0..ADAPTIVE_WINDOW - 1 {
            assert_eq!(pacer.plan(slow).adjustment, None);
        }
        let adjustment = pacer.plan(slow).adjustment.unwrap();
        assert_eq!((adjustment.previous, adjustment.current), (60, 54));

        for _ in 0..ADAPTIVE_WINDOW {
            pacer.plan(slow);
        }
        assert_eq!(pacer.effective_fps(), 50);

        for _ in 0..ADAPTIVE_WINDOW * 5 {
            pacer.plan(slow);
            assert!(pacer.effective_fps() >= 50);
        }
        assert_eq!(pacer.effective_fps(), 50);
    }

    #[test]
    fn test_light_load_raises_fps_up_to_target() {
        let mut pacer = FramePacer::new(config(60, 10, 120, true));
        for _ in 0..ADAPTIVE_WINDOW {
            pacer.plan(Duration::from_millis(40));
        }
        assert_eq!(pacer.effective_fps(), 54);

        let fast = Duration::from_millis(1);
        for _ in 0..ADAPTIVE_WINDOW {
            pacer.plan(fast);
        }
        assert_eq!(pacer.effective_fps(), 59);
        for _ in 0..ADAPTIVE_WINDOW * 3 {
            pacer.plan(fast);
        }
        assert_eq!(pacer.effective_fps(), 60);
    }

    #[test]
    fn test_mixed_load_keeps_fps() {
        let mut pacer = FramePacer::new(config(60, 10, 120, true));
        for tick in 0..ADAPTIVE_WINDOW * 4 {
            let elapsed = if tick % 2 == 0 { 30 } else { 10 };
            assert_eq!(pacer.plan(Duration::from_millis(elapsed)).adjustment, None);
        }
        assert_eq!(pacer.effective_fps(), 60);
    }

    #[test]
    fn test_fixed_rate_never_adapts() {
        let mut pacer = FramePacer::new(config(60, 10, 120, false));
        for _ in 0..ADAPTIVE_WINDOW * 3 {
            pacer.plan(Duration::from_millis(100));
        }
        assert_eq!(pacer.effective_fps(), 60);
    }

    #[test]
    fn test_configure_normalizes_bounds() {
        let mut pacer = FramePacer::default();
        pacer.configure(config(200, 30, 90, true));
        assert_eq!(pacer.config().target_fps, 90);
        assert_eq!(pacer.effective_fps(), 90);

        pacer.configure(config(10, 40, 20, true));
        assert_eq!(pacer.config().min_fps, 40);
        assert_eq!(pacer.config().max_fps, 40);
        assert_eq!(pacer.effective_fps(), 40);
    }

    #[test]
    fn test_precision_sleeper() {
        let sleeper = PrecisionSleeper::default();
        let running = AtomicBool::new(false);
        let started = Instant::now();
        assert!(sleeper.sleep(Duration::from_millis(15), &running));
        assert!(Instant::now() - started >= Duration::from_millis(15));

        let stopped = AtomicBool::new(true);
        let started = Instant::now();
        assert!(!sleeper.sleep(Duration::from_secs(5), &stopped));
        assert!(Instant::now() - started < Duration::from_secs(1));
    }
}
