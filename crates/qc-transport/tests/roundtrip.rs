use qc_transport::{FrameClient, FrameServer};

#[tokio::test]
async fn request_reply_round_trips() {
    let server = FrameServer::bind("127.0.0.1:0", false).await.unwrap();
    let addr = server.local_addr().unwrap();

    let server_task = tokio::spawn(async move {
        let conn = server.accept().await.unwrap();
        assert_eq!(conn.request(), "GetBlockCount");
        conn.reply("7").await.unwrap();
    });

    let client = FrameClient::default();
    let reply = client
        .request(&format!("tcp://{addr}"), "GetBlockCount")
        .await
        .unwrap();
    assert_eq!(reply, "7");
    server_task.await.unwrap();
}

#[tokio::test]
async fn get_chain_streams_multiple_chunks() {
    let server = FrameServer::bind("127.0.0.1:0", false).await.unwrap();
    let addr = server.local_addr().unwrap();

    let server_task = tokio::spawn(async move {
        let conn = server.accept().await.unwrap();
        assert_eq!(conn.request(), "GetChain");
        conn.reply_stream(vec!["chunk-a".to_string(), "chunk-b".to_string()])
            .await
            .unwrap();
    });

    let client = FrameClient::default();
    let chunks = client
        .request_stream(&format!("tcp://{addr}"), "GetChain")
        .await
        .unwrap();
    assert_eq!(chunks, vec!["chunk-a".to_string(), "chunk-b".to_string()]);
    server_task.await.unwrap();
}

#[tokio::test]
async fn request_without_fingerprint_is_rejected_outside_debug() {
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpStream;

    let server = FrameServer::bind("127.0.0.1:0", false).await.unwrap();
    let addr = server.local_addr().unwrap();

    let server_task = tokio::spawn(async move { server.accept().await });

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"not-a-real-frame\n").await.unwrap();
    drop(stream);

    let result = server_task.await.unwrap();
    assert!(result.is_err());
}

#[tokio::test]
async fn unreachable_peer_times_out() {
    let client = FrameClient::new(std::time::Duration::from_millis(200));
    let result = client.request("tcp://127.0.0.1:1", "GetBlockCount").await;
    assert!(result.is_err());
}
