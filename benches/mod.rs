use criterion::{criterion_group, criterion_main};


criterion_group!(
    benches,
    network::application::mqtt::codec::bench_serialize_publish,
    network::application::mqtt::codec::bench_encode_connect,
    network::application::mqtt::codec::bench_frame_and_deserialize
);
criterion_main!(benches);
