use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use causaltree_core::{CausalTree, EntityId, MemoryCausalTree, NodeId};

#[derive(serde::Serialize)]
struct Output {
    implementation: &'static str,
    storage: &'static str,
    workload: String,
    timestamp: String,
    name: String,
    total_ops: u64,
    duration_ms: f64,
    ops_per_sec: f64,
    extra: Extra,
    source_file: Option<String>,
}

#[derive(serde::Serialize)]
struct Extra {
    count: u64,
    replicas: u64,
    text_len: usize,
}

const REPLICAS: u64 = 3;

/// Each replica types `count` characters after the shared head, then all replicas exchange
/// snapshots and materialize.
fn run(count: u64) -> (f64, usize) {
    let mut replicas: Vec<MemoryCausalTree> = (1..=REPLICAS)
        .map(|n| CausalTree::in_memory(EntityId::from_u64(n)))
        .collect();

    let start = Instant::now();
    for (i, tree) in replicas.iter_mut().enumerate() {
        let mut anchor = NodeId::ROOT;
        for c in 0..count {
            let value = char::from(b'a' + ((c + i as u64) % 26) as u8);
            anchor = tree.insert_after(anchor, value).expect("insert");
        }
    }
    let snapshots: Vec<_> = replicas
        .iter()
        .map(|t| t.snapshot().expect("snapshot"))
        .collect();
    for tree in replicas.iter_mut() {
        for snap in &snapshots {
            tree.merge(snap).expect("merge");
        }
    }
    let text_len = replicas[0].value().expect("materialize").len();
    (start.elapsed().as_secs_f64() * 1000.0, text_len)
}

fn main() {
    let mut count: u64 = 200;
    let mut out_file: Option<PathBuf> = None;
    for arg in env::args().skip(1) {
        if let Some(val) = arg.strip_prefix("--count=") {
            count = val.parse().unwrap_or(count);
        } else if let Some(val) = arg.strip_prefix("--out=") {
            out_file = Some(PathBuf::from(val));
        }
    }

    let (duration_ms, text_len) = run(count);
    let total_ops = count * REPLICAS + REPLICAS * REPLICAS;

    let output = Output {
        implementation: "causaltree-core-memory",
        storage: "memory",
        workload: format!("type-merge-{}", count),
        timestamp: chrono::Utc::now().to_rfc3339(),
        name: format!("type-merge-{}", count),
        total_ops,
        duration_ms,
        ops_per_sec: if duration_ms > 0.0 {
            total_ops as f64 / duration_ms * 1000.0
        } else {
            f64::INFINITY
        },
        extra: Extra {
            count,
            replicas: REPLICAS,
            text_len,
        },
        source_file: out_file.as_ref().map(|p| p.display().to_string()),
    };

    let json = serde_json::to_string_pretty(&output).expect("serialize");
    if let Some(path) = out_file {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdirs");
        }
        fs::write(&path, &json).expect("write output");
    }
    println!("{}", json);
}
