use libiot_mqtt::network::application::mqtt::MAX_CONFIG_SUBSCRIPTIONS;
use libiot_mqtt::{ClientConfig, Error, QoS};

#[test]
fn test_config_drives_connect_and_subscribe() {
    let json = r#"{
        "connect": { "clean_session": true, "keep_alive_seconds": 30, "client_identifier": "dev1" },
        "will": { "topic": "dev1/status", "message": "offline" },
        "subscriptions": [
            { "topic_filter": "dev1/cmd/#", "qos": 2 }
        ]
    }"#;
    let config = ClientConfig::from_json(json).unwrap();
    assert_eq!(config.subscriptions[0].qos, QoS::ExactlyOnce);

    let mut buffer = [0u8; 64];
    let written = config.connect_packet().encode(&mut buffer).unwrap();
    // 10 + (2+4) + (2+11) + (2+7)
    assert_eq!(&buffer[..2], &[0x10, 38]);
    assert_eq!(written, 40);
    // will, clean session
    assert_eq!(buffer[9], 0x06);
    assert_eq!(&buffer[10..12], &[0x00, 30]);

    let written = config.subscribe_packet(1).unwrap().encode(&mut buffer).unwrap();
    assert_eq!(buffer[written - 1], 2);
}

#[test]
fn test_too_many_subscriptions() {
    let mut json = String::from(r#"{"connect":{"client_identifier":"d"},"subscriptions":["#);
    for i in 0..=MAX_CONFIG_SUBSCRIPTIONS {
        if i > 0 {
            json.push(',');
        }
        json.push_str(r#"{"topic_filter":"t"}"#);
    }
    json.push_str("]}");
    assert_eq!(ClientConfig::from_json(&json), Err(Error::BadParameter));
}
