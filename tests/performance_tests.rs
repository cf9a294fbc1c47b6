use std::time::{Duration, Instant};
use tartsmon::core::gateway::CommandQueue;
use tartsmon::{decode_line, Event, TartsConfig};

/// Performance and stress tests
#[cfg(test)]
mod performance_tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_decode_throughput() {
        let lines = [
            "WD:100123,2,-58,2.9,0,E100\r\n",
            "WD:100456,9,-71,3.0,1,0A0B0C\r\n",
            "WJ:100789\r\n",
            "WS:100789,2,0\r\n",
            "ID:5F3A01\r\n",
            "garbage\r\n",
        ];

        let start = Instant::now();
        let mut decoded = 0;
        for _ in 0..10_000 {
            for line in &lines {
                if decode_line(line).is_some() {
                    decoded += 1;
                }
            }
        }
        let elapsed = start.elapsed();

        assert_eq!(decoded, 50_000);
        assert!(elapsed < Duration::from_secs(2), "Decoding too slow: {:?}", elapsed);
    }

    #[test]
    fn test_event_fire_performance() {
        let event: Event<u32> = Event::new();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            event.subscribe(Arc::new(move |_: &u32| {
                counter.fetch_add(1, Ordering::Relaxed);
            }));
        }

        let start = Instant::now();
        for i in 0..10_000 {
            event.fire(&i);
        }
        let elapsed = start.elapsed();

        assert_eq!(counter.load(Ordering::Relaxed), 100_000);
        assert!(elapsed < Duration::from_secs(1), "Event dispatch too slow: {:?}", elapsed);
    }

    #[test]
    fn test_command_queue_concurrent_producers() {
        let queue = CommandQueue::new();
        let producers: Vec<_> = (0..4)
            .map(|n| {
                let queue = queue.clone();
                std::thread::spawn(move || {
                    for i in 0..250 {
                        queue.enqueue(format!("at$p{}_{}", n, i));
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().expect("Thread panicked");
        }

        assert_eq!(queue.len(), 1000);
        let mut drained = 0;
        while let Some(command) = queue.pop() {
            assert!(command.ends_with('\r'));
            drained += 1;
        }
        assert_eq!(drained, 1000);
    }

    #[test]
    fn test_config_serialization_performance() {
        let config = TartsConfig::default();

        let start = Instant::now();
        for _ in 0..1000 {
            let serialized = toml::to_string(&config).expect("Failed to serialize");
            let _: TartsConfig = toml::from_str(&serialized).expect("Failed to deserialize");
        }
        let elapsed = start.elapsed();

        assert!(elapsed < Duration::from_secs(2), "Config serialization too slow: {:?}", elapsed);
    }
}
