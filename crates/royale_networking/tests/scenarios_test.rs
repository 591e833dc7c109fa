//! End-to-end scenarios over the shipped definition data.
//!
//! Each test drives the public API the way the server and a client would:
//! one shared registry set, an encoder on one side, a decoder on the other.

use std::sync::Arc;

use royale_networking::protocol::stream::{dequantize, quantize};
use royale_networking::protocol::update::{HealthBounds, PlayerData, HEALTH_BITS};
use royale_networking::protocol::{PlayerStateCache, VariantStream};
use royale_networking::{
    encode_frame, packet_channel, BitReader, BitWriter, Connection, DecodeError, KillFeedMessage, ObjectId, Packet,
    PacketDecoder, PacketEncoder, ProtocolConfig, UpdateMessage,
};
use royale_shared::Definitions;

const DEFINITIONS_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/definitions.toml");
const PROTOCOL_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/protocol.toml");

fn definitions() -> Arc<Definitions> {
    Arc::new(Definitions::from_file(DEFINITIONS_PATH).unwrap())
}

#[test]
fn scenario_five_member_registry() {
    let definitions = definitions();
    let obstacles = &definitions.obstacles;
    assert_eq!(obstacles.len(), 5);
    assert_eq!(obstacles.bits(), 3);

    let last = obstacles.index(4).unwrap();
    let mut writer = BitWriter::with_capacity(4);
    obstacles.write_to_stream(&mut writer, last).unwrap();
    writer.write_bits(5, obstacles.bits()).unwrap();
    assert_eq!(writer.bit_len(), 6);

    let mut reader = BitReader::new(writer.as_slice());
    assert_eq!(obstacles.read_from_stream(&mut reader).unwrap(), last);
    assert_eq!(
        obstacles.read_from_stream(&mut reader),
        Err(DecodeError::InvalidVariantIndex {
            registry: "obstacles",
            index: 5,
            len: 5,
        })
    );
}

#[test]
fn scenario_fixed_float_steps() {
    assert_eq!(quantize(37.5, 0.0, 100.0, 8), 95);

    let decoded = dequantize(95, 0.0, 100.0, 8);
    assert!((decoded - 37.254_9).abs() < 1e-3);
    assert!((37.5 - decoded).abs() <= 100.0 / 255.0);

    let mut writer = BitWriter::with_capacity(1);
    writer.write_float(37.5, 0.0, 100.0, 8).unwrap();
    assert_eq!(writer.as_slice(), &[95]);
}

#[test]
fn scenario_deleted_objects_only() {
    let definitions = definitions();
    let mut encoder = PacketEncoder::new(Arc::clone(&definitions));
    let mut decoder = PacketDecoder::new(definitions);

    let update = UpdateMessage {
        deleted_objects: vec![ObjectId(3), ObjectId(7)],
        ..UpdateMessage::default()
    };
    let bytes = encoder.encode(&Packet::Update(Box::new(update.clone()))).unwrap();
    // tag + flags + count + two ids
    assert_eq!(bytes.len(), (4 + 16 + 16 + 32usize).div_ceil(8));

    let Packet::Update(decoded) = decoder.decode(&bytes).unwrap() else {
        panic!("expected an update");
    };
    assert_eq!(decoded.deleted_objects, vec![ObjectId(3), ObjectId(7)]);
    assert_eq!(*decoded, update);
    assert!(decoded.player_data.is_none());
    assert!(decoded.gas.is_none());
    assert!(decoded.alive_count.is_none());
    assert!(decoded.full_objects.is_empty());
    assert!(decoded.new_players.is_empty());
}

#[test]
fn scenario_health_dirty_adrenaline_clean() {
    let definitions = definitions();
    let mut previous = PlayerStateCache::new();
    previous.apply(&PlayerData {
        bounds: Some(HealthBounds {
            max_health: 150.0,
            min_adrenaline: 0.0,
            max_adrenaline: 100.0,
        }),
        adrenaline: Some(42.0),
        ..PlayerData::default()
    });

    let data = PlayerData {
        health: Some(75.0),
        ..PlayerData::default()
    };
    let mut writer = BitWriter::with_capacity(8);
    data.write(&mut writer, &definitions, &previous).unwrap();
    assert_eq!(writer.bit_len(), 7 + usize::from(HEALTH_BITS));

    let mut reader = BitReader::new(writer.as_slice());
    let decoded = PlayerData::read(&mut reader, &definitions, &previous).unwrap();
    assert_eq!(reader.bit_position(), writer.bit_len());
    assert!(decoded.adrenaline.is_none());
    assert!((decoded.health.unwrap() - 75.0).abs() <= 150.0 / 4095.0);

    let mut current = previous.clone();
    current.apply(&decoded);
    assert_eq!(current.adrenaline, 42.0);
    assert_eq!(current.bounds.max_health, 150.0);
}

#[test]
fn scenario_kill_leader_dead() {
    let definitions = definitions();
    let mut encoder = PacketEncoder::new(Arc::clone(&definitions));
    let mut decoder = PacketDecoder::new(definitions);

    let message = KillFeedMessage::KillLeaderDead { killer: ObjectId(77) };
    let bytes = encoder.encode(&Packet::KillFeed(message)).unwrap();
    // packet tag + feed tag + killer id
    assert_eq!(bytes.len(), (4 + 2 + 16usize).div_ceil(8));
    assert_eq!(decoder.decode(&bytes).unwrap(), Packet::KillFeed(message));
}

#[test]
fn scenario_bounds_survive_across_packets() {
    let definitions = definitions();
    let mut encoder = PacketEncoder::new(Arc::clone(&definitions));
    let mut decoder = PacketDecoder::new(definitions);

    let opening = UpdateMessage {
        player_data: Some(PlayerData {
            bounds: Some(HealthBounds {
                max_health: 200.0,
                min_adrenaline: 0.0,
                max_adrenaline: 100.0,
            }),
            health: Some(200.0),
            ..PlayerData::default()
        }),
        ..UpdateMessage::default()
    };
    let later = UpdateMessage {
        player_data: Some(PlayerData {
            health: Some(120.0),
            ..PlayerData::default()
        }),
        ..UpdateMessage::default()
    };

    for update in [opening, later] {
        let bytes = encoder.encode(&Packet::Update(Box::new(update))).unwrap();
        decoder.decode(&bytes).unwrap();
    }

    assert_eq!(decoder.cache().bounds.max_health, 200.0);
    assert!((decoder.cache().health - 120.0).abs() <= 200.0 / 4095.0);
    assert_eq!(decoder.cache().bounds, encoder.cache().bounds);
}

#[test]
fn scenario_corrupt_message_between_good_ones() {
    let definitions = definitions();
    let config = ProtocolConfig::from_file(PROTOCOL_PATH).unwrap();
    let mut encoder = PacketEncoder::with_config(Arc::clone(&definitions), &config);
    let connection = Connection::new(definitions, &config);
    let stats = connection.stats();

    let (chunk_tx, chunk_rx) = crossbeam_channel::unbounded::<Vec<u8>>();
    let (packet_tx, packet_rx) = packet_channel(&config);

    let handle = std::thread::spawn(move || connection.run(&chunk_rx, &packet_tx));

    let good = encode_frame(&encoder.encode(&Packet::Ping).unwrap());
    let corrupt = encode_frame(&[0xFF, 0xFF]);
    let mut stream = Vec::new();
    stream.extend_from_slice(&good);
    stream.extend_from_slice(&corrupt);
    stream.extend_from_slice(&good);

    // split mid-frame to exercise reassembly
    let (head, tail) = stream.split_at(good.len() + 3);
    chunk_tx.send(head.to_vec()).unwrap();
    chunk_tx.send(tail.to_vec()).unwrap();
    drop(chunk_tx);
    handle.join().unwrap();

    let received: Vec<Packet> = packet_rx.iter().collect();
    assert_eq!(received, vec![Packet::Ping, Packet::Ping]);
    assert_eq!(stats.frames.load(std::sync::atomic::Ordering::Relaxed), 3);
    assert_eq!(stats.dropped.load(std::sync::atomic::Ordering::Relaxed), 1);
}
