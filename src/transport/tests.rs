use tokio::sync::mpsc;
use tokio::time::{Duration, timeout};

use super::memory::MemoryHub;
use super::{Delivery, QosLevel, Transport};

async fn recv(rx: &mut mpsc::UnboundedReceiver<Delivery>) -> Delivery {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for delivery")
        .expect("delivery channel closed")
}

#[tokio::test]
async fn subscribe_then_publish_delivers() {
    let hub = MemoryHub::new();
    let mut transport = hub.transport();
    let (tx, mut rx) = mpsc::unbounded_channel();

    transport.connect(tx).await.unwrap();
    transport.subscribe("room/group", QosLevel::AtLeastOnce).await.unwrap();

    let publisher = transport.publisher();
    publisher
        .publish("room/group", b"hello".to_vec(), QosLevel::AtLeastOnce)
        .unwrap();

    let delivery = recv(&mut rx).await;
    assert_eq!(delivery.topic, "room/group");
    assert_eq!(delivery.payload, b"hello");
}

#[tokio::test]
async fn fan_out_reaches_every_subscriber_including_the_publisher() {
    let hub = MemoryHub::new();
    let mut a = hub.transport();
    let mut b = hub.transport();
    let (tx_a, mut rx_a) = mpsc::unbounded_channel();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();

    a.connect(tx_a).await.unwrap();
    b.connect(tx_b).await.unwrap();
    a.subscribe("t", QosLevel::AtMostOnce).await.unwrap();
    b.subscribe("t", QosLevel::AtMostOnce).await.unwrap();

    a.publisher().publish("t", b"x".to_vec(), QosLevel::AtMostOnce).unwrap();

    assert_eq!(recv(&mut rx_a).await.payload, b"x");
    assert_eq!(recv(&mut rx_b).await.payload, b"x");
}

#[tokio::test]
async fn unsubscribe_stops_delivery() {
    let hub = MemoryHub::new();
    let mut transport = hub.transport();
    let (tx, mut rx) = mpsc::unbounded_channel();

    transport.connect(tx).await.unwrap();
    transport.subscribe("t", QosLevel::AtMostOnce).await.unwrap();
    transport.unsubscribe("t").await.unwrap();

    transport
        .publisher()
        .publish("t", b"x".to_vec(), QosLevel::AtMostOnce)
        .unwrap();

    assert!(
        timeout(Duration::from_millis(100), rx.recv()).await.is_err(),
        "unsubscribed transport still received a delivery"
    );
}

#[tokio::test]
async fn publish_without_subscribers_is_silent() {
    let hub = MemoryHub::new();
    let mut transport = hub.transport();
    let (tx, _rx) = mpsc::unbounded_channel();
    transport.connect(tx).await.unwrap();

    // No panic, no error: there is simply nobody listening.
    transport
        .publisher()
        .publish("nobody", b"x".to_vec(), QosLevel::AtMostOnce)
        .unwrap();
}

#[tokio::test]
async fn subscribe_before_connect_fails() {
    let hub = MemoryHub::new();
    let mut transport = hub.transport();
    assert!(transport.subscribe("t", QosLevel::AtMostOnce).await.is_err());
}

#[tokio::test]
async fn disconnected_transport_no_longer_receives() {
    let hub = MemoryHub::new();
    let mut a = hub.transport();
    let mut b = hub.transport();
    let (tx_a, mut rx_a) = mpsc::unbounded_channel();
    let (tx_b, _rx_b) = mpsc::unbounded_channel();

    a.connect(tx_a).await.unwrap();
    b.connect(tx_b).await.unwrap();
    a.subscribe("t", QosLevel::AtMostOnce).await.unwrap();
    a.disconnect().await.unwrap();

    b.publisher().publish("t", b"x".to_vec(), QosLevel::AtMostOnce).unwrap();

    // Either the channel is already closed or nothing arrives.
    let outcome = timeout(Duration::from_millis(100), rx_a.recv()).await;
    assert!(
        !matches!(outcome, Ok(Some(_))),
        "disconnected transport still received a delivery"
    );
}
