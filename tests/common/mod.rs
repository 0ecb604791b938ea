//! Shared fixtures for the integration tests.

#![allow(clippy::expect_used, dead_code)]

use planqa_rs::contract::catalog::all_contracts;
use planqa_rs::contract::schema::Contract;
use planqa_rs::core::{Chunk, Dimension, PolicyArea};
use planqa_rs::questionnaire::{default_clusters, layout_questions};
use planqa_rs::signal::default_pack;
use serde_json::json;
use std::path::{Path, PathBuf};

/// Rich chunk body exercising every analyzer.
pub const CHUNK_BODY: &str = "El diagnóstico territorial muestra una brecha de cobertura del \
    45% en 2020. El objetivo del programa es aumentar la cobertura al 80% en 2027 porque la \
    deserción genera rezago educativo. La Secretaría de Educación asignará $ 1.200 millones \
    del presupuesto municipal para cumplir la meta del cuatrienio.";

/// Writes the questionnaire monolith and returns its path.
pub fn write_monolith(dir: &Path) -> PathBuf {
    let path = dir.join("questionnaire_monolith.json");
    let monolith = json!({
        "questions": layout_questions(),
        "scoring_thresholds": {"EXCELENTE": 0.85, "BUENO": 0.70, "ACEPTABLE": 0.55},
        "clusters": default_clusters(),
        "patterns": [],
    });
    std::fs::write(&path, serde_json::to_string(&monolith).expect("serialize monolith"))
        .expect("write monolith");
    path
}

/// Writes a plan text document and returns its path.
pub fn write_plan(dir: &Path) -> PathBuf {
    let path = dir.join("plan.txt");
    std::fs::write(&path, CHUNK_BODY.repeat(80)).expect("write plan");
    path
}

/// The full 60-cell chunk grid with rich bodies.
pub fn full_chunks() -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for pa in PolicyArea::ALL {
        for dim in Dimension::ALL {
            chunks.push(Chunk::new(pa, dim, format!("{CHUNK_BODY} Sección {pa} {dim}.")));
        }
    }
    chunks
}

/// Writes the segmented-text sidecar for a plan document.
pub fn write_sidecar(plan: &Path, chunks: &[Chunk]) {
    let sidecar = plan.with_extension("segments.json");
    std::fs::write(&sidecar, serde_json::to_string(chunks).expect("serialize chunks"))
        .expect("write sidecar");
}

/// Writes a contracts directory and returns its path.
pub fn write_contracts_dir(dir: &Path, contracts: &[Contract]) -> PathBuf {
    let contracts_dir = dir.join("contracts");
    std::fs::create_dir_all(&contracts_dir).expect("create contracts dir");
    for contract in contracts {
        let path = contracts_dir.join(format!("{}.v3.json", contract.identity.question_id));
        std::fs::write(&path, serde_json::to_string(contract).expect("serialize contract"))
            .expect("write contract");
    }
    contracts_dir
}

/// Writes the ten signal packs and returns the directory.
pub fn write_signal_packs(dir: &Path) -> PathBuf {
    let packs_dir = dir.join("signal_packs");
    std::fs::create_dir_all(&packs_dir).expect("create packs dir");
    for pa in PolicyArea::ALL {
        let pack = default_pack(pa);
        std::fs::write(
            packs_dir.join(format!("enriched_signal_pack_{pa}.json")),
            serde_json::to_string(&pack).expect("serialize pack"),
        )
        .expect("write pack");
    }
    packs_dir
}

/// The catalog contracts, for tampering in defect scenarios.
pub fn catalog_contracts() -> Vec<Contract> {
    all_contracts()
}
