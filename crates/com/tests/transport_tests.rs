use {
    com::*,
    std::sync::{Arc, Mutex},
    tokio::time::{Duration, sleep, timeout},
};

#[derive(Default)]
struct Recorder {
    predictions: Mutex<Vec<Vec<String>>>,
    states: Mutex<Vec<ConnectionState>>,
    errors: Mutex<Vec<String>>,
}

impl TransportHandler for Recorder {
    fn on_prediction(&self, message: PredictionMessage) {
        self.predictions.lock().unwrap().push(message.labels);
    }

    fn on_state(&self, state: ConnectionState) {
        self.states.lock().unwrap().push(state);
    }

    fn on_error(&self, error: &ComError) {
        self.errors.lock().unwrap().push(error.to_string());
    }
}

async fn open(server: &WsServer) -> (Connection, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let connection = Connection::open(&server.endpoint(), recorder.clone()).unwrap();
    let state = timeout(Duration::from_secs(5), connection.wait_settled())
        .await
        .expect("handshake timed out");
    assert_eq!(state, ConnectionState::Open);
    (connection, recorder)
}

async fn wait_for_client(server: &WsServer) {
    timeout(Duration::from_secs(5), async {
        while server.client_count().await == 0 {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("client never registered");
}

async fn wait_until(mut done: impl FnMut() -> bool) {
    timeout(Duration::from_secs(5), async {
        while !done() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_frames_reach_backend_as_binary() {
    let mut server = WsServer::bind("127.0.0.1:0").await.unwrap();
    let (connection, _recorder) = open(&server).await;

    assert!(connection.send(vec![0xFF, 0xD8, 1, 2, 3]));
    let frame = timeout(Duration::from_secs(5), server.recv())
        .await
        .expect("recv timed out")
        .unwrap();
    assert_eq!(frame.data, vec![0xFF, 0xD8, 1, 2, 3]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_labels_delivered_in_order() {
    let server = WsServer::bind("127.0.0.1:0").await.unwrap();
    let (_connection, recorder) = open(&server).await;
    wait_for_client(&server).await;

    server.send_labels(&["hello_2".to_string()]).await;
    server
        .send_labels(&["hello_2".to_string(), "thanks_1".to_string()])
        .await;

    wait_until(|| recorder.predictions.lock().unwrap().len() == 2).await;
    let predictions = recorder.predictions.lock().unwrap().clone();
    assert_eq!(predictions[0], vec!["hello_2"]);
    assert_eq!(predictions[1], vec!["hello_2", "thanks_1"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_malformed_text_is_skipped() {
    let server = WsServer::bind("127.0.0.1:0").await.unwrap();
    let (connection, recorder) = open(&server).await;
    wait_for_client(&server).await;

    server.send_text("{not json").await;
    server.send_labels(&["ok_1".to_string()]).await;

    wait_until(|| recorder.predictions.lock().unwrap().len() == 1).await;
    assert_eq!(recorder.predictions.lock().unwrap()[0], vec!["ok_1"]);
    assert_eq!(connection.state(), ConnectionState::Open);
}

#[tokio::test]
async fn test_invalid_endpoint_is_rejected() {
    let recorder = Arc::new(Recorder::default());
    assert!(matches!(
        Connection::open("http://127.0.0.1:8000/ws", recorder.clone()),
        Err(ComError::InvalidEndpoint(_))
    ));
    assert!(matches!(
        Connection::open("not a uri", recorder),
        Err(ComError::InvalidEndpoint(_))
    ));
}

#[test]
fn test_open_outside_runtime_fails() {
    let recorder = Arc::new(Recorder::default());
    assert!(matches!(
        Connection::open("ws://127.0.0.1:8000/ws", recorder),
        Err(ComError::NoRuntime)
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unreachable_backend_fails() {
    // bind then drop to get a port nobody listens on
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let recorder = Arc::new(Recorder::default());
    let connection = Connection::open(&format!("ws://{addr}/ws"), recorder.clone()).unwrap();

    let state = timeout(Duration::from_secs(5), connection.wait_settled())
        .await
        .unwrap();
    assert_eq!(state, ConnectionState::Failed);
    assert_eq!(recorder.errors.lock().unwrap().len(), 1);
    assert!(!connection.send(vec![1, 2, 3]));
    assert!(!recorder.states.lock().unwrap().contains(&ConnectionState::Open));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_send_before_open_is_dropped() {
    let server = WsServer::bind("127.0.0.1:0").await.unwrap();
    let recorder = Arc::new(Recorder::default());
    let connection = Connection::open(&server.endpoint(), recorder).unwrap();
    if connection.state() == ConnectionState::Connecting {
        assert!(!connection.send(vec![1]));
    }
    connection.close();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_close_is_idempotent() {
    let server = WsServer::bind("127.0.0.1:0").await.unwrap();
    let (connection, recorder) = open(&server).await;

    connection.close();
    connection.close();
    let state = timeout(Duration::from_secs(5), connection.wait_closed())
        .await
        .unwrap();
    assert_eq!(state, ConnectionState::Closed);
    connection.close();

    assert!(!connection.send(vec![1, 2, 3]));
    let states = recorder.states.lock().unwrap().clone();
    assert_eq!(
        states,
        vec![
            ConnectionState::Connecting,
            ConnectionState::Open,
            ConnectionState::Closing,
            ConnectionState::Closed,
        ]
    );
    assert!(recorder.errors.lock().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_backend_close_is_reported() {
    let server = WsServer::bind("127.0.0.1:0").await.unwrap();
    let (connection, recorder) = open(&server).await;
    wait_for_client(&server).await;

    server.close_all().await;
    let state = timeout(Duration::from_secs(5), connection.wait_closed())
        .await
        .unwrap();
    assert_eq!(state, ConnectionState::Closed);
    assert_eq!(recorder.errors.lock().unwrap().len(), 1);
    assert!(!connection.send(vec![1]));
}
