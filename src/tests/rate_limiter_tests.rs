use crate::error::ProfileError;
use crate::rate_limiter::{EndpointClass, RateTier, RequestRateLimiter};
use std::time::Duration;

fn tiny_limiter(max_requests: u32, window: Duration) -> RequestRateLimiter {
    let tier = RateTier {
        window,
        max_requests,
    };
    RequestRateLimiter::new(tier, tier)
}

#[test]
fn allows_up_to_the_limit_then_rejects() {
    let limiter = tiny_limiter(5, Duration::from_secs(60));

    for i in 0..5 {
        assert!(
            limiter.check("client-a", EndpointClass::Default).is_ok(),
            "request {} within the limit should be allowed",
            i + 1
        );
    }

    let rejection = limiter.check("client-a", EndpointClass::Default);
    match rejection {
        Err(ProfileError::RateLimited { retry_after }) => {
            assert!(retry_after > Duration::ZERO);
        }
        other => panic!("expected rate limit rejection, got {other:?}"),
    }
}

#[test]
fn clients_are_limited_independently() {
    let limiter = tiny_limiter(2, Duration::from_secs(60));

    assert!(limiter.check("client-a", EndpointClass::Default).is_ok());
    assert!(limiter.check("client-a", EndpointClass::Default).is_ok());
    assert!(limiter.check("client-a", EndpointClass::Default).is_err());

    // A different client still has its full quota
    assert!(limiter.check("client-b", EndpointClass::Default).is_ok());
}

#[test]
fn tiers_are_counted_separately() {
    let default_tier = RateTier {
        window: Duration::from_secs(60),
        max_requests: 1,
    };
    let public_read_tier = RateTier {
        window: Duration::from_secs(60),
        max_requests: 3,
    };
    let limiter = RequestRateLimiter::new(default_tier, public_read_tier);

    assert!(limiter.check("client-a", EndpointClass::Default).is_ok());
    assert!(limiter.check("client-a", EndpointClass::Default).is_err());

    // Exhausting the default tier leaves the public read tier untouched
    assert!(limiter.check("client-a", EndpointClass::PublicRead).is_ok());
    assert!(limiter.check("client-a", EndpointClass::PublicRead).is_ok());
    assert!(limiter.check("client-a", EndpointClass::PublicRead).is_ok());
    assert!(limiter.check("client-a", EndpointClass::PublicRead).is_err());
}

#[test]
fn quota_replenishes_after_the_window() {
    let limiter = tiny_limiter(2, Duration::from_millis(100));

    assert!(limiter.check("client-a", EndpointClass::Default).is_ok());
    assert!(limiter.check("client-a", EndpointClass::Default).is_ok());
    assert!(limiter.check("client-a", EndpointClass::Default).is_err());

    std::thread::sleep(Duration::from_millis(150));

    assert!(
        limiter.check("client-a", EndpointClass::Default).is_ok(),
        "a fresh request after the window should be allowed"
    );
}

#[test]
fn concurrent_requests_never_exceed_the_limit() {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    let limiter = Arc::new(tiny_limiter(10, Duration::from_secs(60)));
    let admitted = Arc::new(AtomicU32::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let limiter = limiter.clone();
            let admitted = admitted.clone();
            std::thread::spawn(move || {
                for _ in 0..5 {
                    if limiter.check("shared-client", EndpointClass::Default).is_ok() {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // 40 attempts against a quota of 10: exactly the quota is admitted
    assert_eq!(admitted.load(Ordering::SeqCst), 10);
}
