use {
    overlay::*,
    std::{
        sync::{Arc, mpsc},
        thread,
    },
    tokio::time::{Duration, timeout},
};

#[test]
fn test_only_newest_frame_survives() {
    let gate = FrameGate::new();
    assert_eq!(gate.submit("F1"), Admission::Admitted);
    assert_eq!(gate.submit("F2"), Admission::Superseded);
    assert_eq!(gate.submit("F3"), Admission::Superseded);

    assert_eq!(gate.take_next(), Some("F3"));
    assert_eq!(gate.take_next(), None);
}

#[test]
fn test_clear_discards_pending() {
    let gate = FrameGate::new();
    gate.submit(1);
    gate.clear();
    assert_eq!(gate.take_next(), None);
    assert_eq!(gate.submit(2), Admission::Admitted);
}

#[test]
fn test_closed_gate_rejects_until_reopened() {
    let gate = FrameGate::new();
    gate.submit(1);
    gate.close();
    assert!(gate.is_closed());
    assert_eq!(gate.take_next(), None);
    assert_eq!(gate.submit(2), Admission::Rejected);

    gate.reopen();
    assert_eq!(gate.submit(3), Admission::Admitted);
    assert_eq!(gate.take_next(), Some(3));
}

#[tokio::test]
async fn test_next_returns_pending_frame() {
    let gate = FrameGate::new();
    gate.submit(7);
    assert_eq!(gate.next().await, Some(7));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_next_wakes_on_submit_and_close() {
    let gate = Arc::new(FrameGate::new());
    let consumer = {
        let gate = Arc::clone(&gate);
        tokio::spawn(async move { gate.next().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    gate.submit(42);
    assert_eq!(
        timeout(Duration::from_secs(5), consumer).await.unwrap().unwrap(),
        Some(42)
    );

    let consumer = {
        let gate = Arc::clone(&gate);
        tokio::spawn(async move { gate.next().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    gate.close();
    assert_eq!(
        timeout(Duration::from_secs(5), consumer).await.unwrap().unwrap(),
        None
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_frames_are_never_repeated_or_reordered() {
    const LAST: u32 = 9_999;
    let gate = Arc::new(FrameGate::new());
    let (taken_tx, taken_rx) = mpsc::channel();
    let producer = {
        let gate = Arc::clone(&gate);
        thread::spawn(move || {
            for i in 0..=LAST {
                gate.submit(i);
                if i % 100 == 0 {
                    thread::sleep(Duration::from_millis(1));
                }
            }
            // the newest frame is never superseded, so the consumer takes it before close
            loop {
                match taken_rx.recv_timeout(Duration::from_secs(5)) {
                    Ok(LAST) | Err(_) => break,
                    Ok(_) => {}
                }
            }
            gate.close();
        })
    };

    let mut seen = Vec::new();
    while let Some(frame) = timeout(Duration::from_secs(5), gate.next()).await.unwrap() {
        seen.push(frame);
        let _ = taken_tx.send(frame);
    }
    producer.join().unwrap();

    assert_eq!(seen.last(), Some(&LAST));
    assert!(seen.windows(2).all(|pair| pair[0] < pair[1]));
}
