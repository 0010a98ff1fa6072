use {
    base::Vec2,
    image::PlaneLayout,
    std::{
        sync::{
            Arc, Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
        time::{Duration, Instant},
    },
    video::{CaptureBackend, CaptureSession, Sensor, SyntheticConfig, VideoError},
};

fn small_camera() -> SyntheticConfig {
    SyntheticConfig::default()
        .with_size(Vec2::new(32, 24))
        .with_frame_rate(200.0)
        .with_layout(PlaneLayout::padded_interleaved(8))
}

fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_start_delivers_frames_from_sensor() {
    let config = small_camera();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_cb = Arc::clone(&seen);
    let mut session = CaptureSession::new(CaptureBackend::Synthetic(config), move |sensor, frame| {
        seen_cb.lock().unwrap().push((sensor, frame.size, frame.y.data[0]));
    });

    let format = session.start(Sensor::Front).expect("start");
    assert_eq!(format.size, Vec2::new(32, 24));
    assert_eq!(session.sensor(), Some(Sensor::Front));

    wait_until(|| seen.lock().unwrap().len() >= 3);
    session.stop();

    for (sensor, size, luma) in seen.lock().unwrap().iter() {
        assert_eq!(*sensor, Sensor::Front);
        assert_eq!(*size, Vec2::new(32, 24));
        assert_eq!(*luma, SyntheticConfig::luma_for(Sensor::Front));
    }
}

#[test]
fn test_every_frame_is_released_once() {
    let config = small_camera();
    let counters = config.counters().clone();
    let mut session = CaptureSession::new(CaptureBackend::Synthetic(config), |_, _| {});

    session.start(Sensor::Back).expect("start");
    wait_until(|| counters.captured() >= 10);
    session.stop();

    assert_eq!(counters.released(), counters.captured());
    assert_eq!(counters.opened(), 1);
    assert_eq!(counters.closed(), 1);
}

#[test]
fn test_panicking_callback_still_releases() {
    let config = small_camera();
    let counters = config.counters().clone();
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_cb = Arc::clone(&calls);
    let mut session = CaptureSession::new(CaptureBackend::Synthetic(config), move |_, _| {
        if calls_cb.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
            panic!("conversion fault");
        }
    });

    session.start(Sensor::Back).expect("start");
    wait_until(|| calls.load(Ordering::SeqCst) >= 6);
    session.stop();

    assert_eq!(counters.released(), counters.captured());
    assert_eq!(counters.captured(), calls.load(Ordering::SeqCst));
}

#[test]
fn test_stop_twice_is_harmless() {
    let config = small_camera();
    let counters = config.counters().clone();
    let mut session = CaptureSession::new(CaptureBackend::Synthetic(config), |_, _| {});

    session.start(Sensor::Back).expect("start");
    wait_until(|| counters.captured() >= 1);
    session.stop();
    let released = counters.released();
    let closed = counters.closed();

    session.stop();
    assert!(!session.is_running());
    assert_eq!(counters.released(), released);
    assert_eq!(counters.closed(), closed);
}

#[test]
fn test_stop_without_start() {
    let mut session = CaptureSession::new(CaptureBackend::default(), |_, _| {});
    session.stop();
    assert!(!session.is_running());
}

#[test]
fn test_switch_never_overlaps_sensors() {
    let config = small_camera();
    let in_callback = Arc::new(AtomicUsize::new(0));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let order = Arc::new(Mutex::new(Vec::new()));
    let (in_cb, overlaps_cb, order_cb) = (
        Arc::clone(&in_callback),
        Arc::clone(&overlaps),
        Arc::clone(&order),
    );
    let mut session = CaptureSession::new(CaptureBackend::Synthetic(config), move |sensor, _| {
        if in_cb.fetch_add(1, Ordering::SeqCst) != 0 {
            overlaps_cb.fetch_add(1, Ordering::SeqCst);
        }
        order_cb.lock().unwrap().push(sensor);
        thread::sleep(Duration::from_millis(1));
        in_cb.fetch_sub(1, Ordering::SeqCst);
    });

    session.start(Sensor::Back).expect("start");
    wait_until(|| order.lock().unwrap().len() >= 3);
    assert_eq!(session.switch().expect("switch"), Sensor::Front);
    wait_until(|| order.lock().unwrap().iter().filter(|s| **s == Sensor::Front).count() >= 3);
    session.stop();

    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    let order = order.lock().unwrap();
    let first_front = order
        .iter()
        .position(|s| *s == Sensor::Front)
        .expect("front frames");
    assert!(first_front >= 3);
    assert!(order[..first_front].iter().all(|s| *s == Sensor::Back));
    assert!(order[first_front..].iter().all(|s| *s == Sensor::Front));
}

#[test]
fn test_bind_failure_leaves_session_stopped() {
    let config = small_camera().with_unavailable(Sensor::Front);
    let mut session = CaptureSession::new(CaptureBackend::Synthetic(config), |_, _| {});

    let result = session.start(Sensor::Front);
    assert!(matches!(result, Err(VideoError::Bind(_))));
    assert!(!session.is_running());
}

#[test]
fn test_switch_to_unavailable_sensor_stops() {
    let config = small_camera().with_unavailable(Sensor::Front);
    let mut session = CaptureSession::new(CaptureBackend::Synthetic(config), |_, _| {});

    session.start(Sensor::Back).expect("start");
    assert!(matches!(session.switch(), Err(VideoError::Bind(_))));
    assert!(!session.is_running());
    assert!(matches!(session.switch(), Err(VideoError::Inactive)));
}

#[test]
fn test_capture_failure_reopens_device() {
    let config = small_camera().with_fail_after(2);
    let counters = config.counters().clone();
    let mut session = CaptureSession::new(CaptureBackend::Synthetic(config), |_, _| {});

    session.start(Sensor::Back).expect("start");
    wait_until(|| counters.opened() >= 3);
    session.stop();

    assert!(counters.captured() >= 4);
    assert_eq!(counters.released(), counters.captured());
    assert_eq!(counters.opened(), counters.closed());
}

#[test]
fn test_stop_returns_when_device_stalls() {
    let config = small_camera().with_stall_after(2);
    let counters = config.counters().clone();
    let mut session = CaptureSession::new(CaptureBackend::Synthetic(config), |_, _| {});

    session.start(Sensor::Back).expect("start");
    wait_until(|| counters.captured() >= 2);
    thread::sleep(Duration::from_millis(50));

    let started = Instant::now();
    session.stop();
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(!session.is_running());
    assert_eq!(counters.released(), counters.captured());
    assert_eq!(counters.opened(), counters.closed());
}

#[test]
fn test_switch_away_from_stalled_sensor() {
    let config = small_camera().with_stall_after(1);
    let counters = config.counters().clone();
    let mut session = CaptureSession::new(CaptureBackend::Synthetic(config), |_, _| {});

    session.start(Sensor::Back).expect("start");
    wait_until(|| counters.captured() >= 1);

    let started = Instant::now();
    assert_eq!(session.switch().expect("switch"), Sensor::Front);
    assert!(started.elapsed() < Duration::from_secs(1));
    session.stop();
    assert_eq!(counters.opened(), counters.closed());
}

#[test]
fn test_sensor_parsing() {
    assert_eq!("front".parse::<Sensor>(), Ok(Sensor::Front));
    assert_eq!("BACK".parse::<Sensor>(), Ok(Sensor::Back));
    assert!("side".parse::<Sensor>().is_err());
    assert_eq!(Sensor::Front.opposite(), Sensor::Back);
}
