//! # Property-Based Tests
//!
//! Codec round-trip laws and the documented index append race.

use proptest::collection::vec;
use proptest::prelude::*;
use subglacial_core::{
    IndexManager, MemoryStore, Record, RecordId, Status, decode_index, decode_record,
    encode_index, encode_record,
};

// =============================================================================
// STRATEGIES
// =============================================================================

fn status() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Pending),
        Just(Status::Analyzed),
        Just(Status::Anomaly),
    ]
}

fn record() -> impl Strategy<Value = Record> {
    (
        "[0-9]{13}-[0-9a-z]{7}",
        "\\PC{0,64}",
        -1.0e6f64..1.0e6,
        -50.0f64..50.0,
        0.0f64..400.0,
        any::<bool>(),
        0i64..4_102_444_800,
        "0x[0-9a-fA-F]{40}",
        status(),
    )
        .prop_map(
            |(id, location, depth, temperature, salinity, life_signs, timestamp, researcher, status)| {
                Record {
                    id: RecordId(id),
                    location,
                    depth,
                    temperature,
                    salinity,
                    life_signs,
                    timestamp,
                    researcher,
                    status,
                }
            },
        )
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// decode(encode(r)) == r for every record.
    #[test]
    fn record_roundtrip(r in record()) {
        let bytes = encode_record(&r).expect("encode");
        prop_assert_eq!(decode_record(&bytes).expect("decode"), r);
    }

    /// A blob without `status` decodes as pending, everything else intact.
    #[test]
    fn record_without_status_is_pending(r in record()) {
        let bytes = encode_record(&r).expect("encode");
        let mut value: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        value.as_object_mut().expect("object").remove("status");
        let stripped = serde_json::to_vec(&value).expect("json");

        let decoded = decode_record(&stripped).expect("decode");
        prop_assert_eq!(decoded.status, Status::Pending);
        prop_assert_eq!(decoded, Record { status: Status::Pending, ..r });
    }

    /// The index codec preserves order and duplicates.
    #[test]
    fn index_roundtrip(ids in vec("[0-9a-z-]{1,24}", 0..50)) {
        let ids: Vec<RecordId> = ids.into_iter().map(RecordId).collect();
        let bytes = encode_index(&ids).expect("encode");
        prop_assert_eq!(decode_index(&bytes).expect("decode"), ids);
    }

    /// Two appends that both read before either writes lose one update:
    /// the index ends with exactly one of the two ids, the last written.
    #[test]
    fn interleaved_appends_keep_only_last_writer(
        prior in vec("[0-9]{3}-[a-z]{3}", 0..10),
        a in "a[0-9a-z]{6}",
        b in "b[0-9a-z]{6}",
        a_writes_last in any::<bool>(),
    ) {
        let prior: Vec<RecordId> = prior.into_iter().map(RecordId).collect();
        let (a, b) = (RecordId(a), RecordId(b));

        let final_index = runtime().block_on(async {
            let store = MemoryStore::new();
            let index = IndexManager::new(&store);
            index.write(&prior).await.expect("seed");

            let mut read_by_a = index.read_for_update().await.expect("read a");
            let mut read_by_b = index.read_for_update().await.expect("read b");
            read_by_a.push(a.clone());
            read_by_b.push(b.clone());

            if a_writes_last {
                index.write(&read_by_b).await.expect("write b");
                index.write(&read_by_a).await.expect("write a");
            } else {
                index.write(&read_by_a).await.expect("write a");
                index.write(&read_by_b).await.expect("write b");
            }
            index.list().await
        });

        let survivor = if a_writes_last { &a } else { &b };
        let lost = if a_writes_last { &b } else { &a };

        prop_assert_eq!(final_index.len(), prior.len() + 1);
        prop_assert_eq!(&final_index[..prior.len()], &prior[..]);
        prop_assert!(final_index.contains(survivor));
        prop_assert!(!final_index.contains(lost));
    }

    /// Sequential appends never lose an update.
    #[test]
    fn sequential_appends_keep_everything(ids in vec("[0-9a-z]{1,12}", 0..30)) {
        let ids: Vec<RecordId> = ids.into_iter().map(RecordId).collect();
        let listed = runtime().block_on(async {
            let store = MemoryStore::new();
            let index = IndexManager::new(&store);
            for id in &ids {
                index.append(id.clone()).await.expect("append");
            }
            index.list().await
        });
        prop_assert_eq!(listed, ids);
    }
}
