mod tests {
    use embassy_time::{Duration, Instant};
    use lightbox_core::monitor::{MONITOR_WINDOW, PerformanceMonitor, PerformanceSample};

    fn sample(total_ms: u64, late: bool) -> PerformanceSample {
        PerformanceSample {
            timestamp: Instant::now(),
            generation: Duration::from_millis(total_ms / 2),
            swap: Duration::from_millis(1),
            total: Duration::from_millis(total_ms),
            late,
        }
    }

    #[test]
    fn test_empty_monitor() {
        let monitor = PerformanceMonitor::new();
        let stats = monitor.stats();
        assert!(monitor.is_empty());
        assert_eq!(stats.samples, 0);
        assert_eq!(stats.fps.avg, 0.0);
        assert_eq!(stats.late_rate, 0.0);
    }

    #[test]
    fn test_stats_over_window() {
        let mut monitor = PerformanceMonitor::new();
        monitor.record(sample(10, false));
        monitor.record(sample(20, false));
        monitor.record(sample(40, true));
        monitor.record(sample(50, true));

        let stats = monitor.stats();
        assert_eq!(stats.samples, 4);
        assert_eq!(stats.tick_ms.min, 10.0);
        assert_eq!(stats.tick_ms.max, 50.0);
        assert_eq!(stats.tick_ms.avg, 30.0);
        assert_eq!(stats.tick_ms.current, 50.0);
        assert_eq!(stats.fps.max, 100.0);
        assert_eq!(stats.fps.min, 20.0);
        assert_eq!(stats.fps.current, 20.0);
        assert_eq!(stats.swap_ms.avg, 1.0);
        assert_eq!(stats.late_rate, 0.5);
        assert_eq!(stats.total_late_frames, 2);
    }

    #[test]
    fn test_ring_evicts_oldest() {
        let mut monitor = PerformanceMonitor::new();
        monitor.record(sample(100, true));
        for _ in 0..MONITOR_WINDOW {
            monitor.record(sample(10, false));
        }

        let stats = monitor.stats();
        assert_eq!(monitor.len(), MONITOR_WINDOW);
        assert_eq!(stats.tick_ms.max, 10.0);
        assert_eq!(stats.late_rate, 0.0);
        assert_eq!(stats.total_frames, MONITOR_WINDOW as u64 + 1);
        assert_eq!(stats.total_late_frames, 1);
    }
}
