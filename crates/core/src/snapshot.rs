use crate::driver::RunReport;
use crate::score::{FamilyScore, FinalScore};
use crate::verify::Verdict;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sortlab_config::{AuxiliaryPolicy, TestCorpus};

#[derive(Serialize, Deserialize, Debug)]
pub struct RunSnapshot {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub student: String,
    pub routine: String,
    pub auxiliary_policy: AuxiliaryPolicy,
    pub corpus_hash: String,
    pub swap: FamilyScore,
    pub sort: FamilyScore,
    pub final_score: FinalScore,
    pub points: u32,
    pub verdicts: Vec<Verdict>,
}

impl RunSnapshot {
    pub fn new(
        report: &RunReport,
        student: &str,
        routine: &str,
        policy: AuxiliaryPolicy,
        corpus: &TestCorpus,
    ) -> Self {
        Self {
            kind: "sortlab_run".to_string(),
            status: if report.all_passed() { "pass" } else { "fail" }.to_string(),
            student: student.to_string(),
            routine: routine.to_string(),
            auxiliary_policy: policy,
            corpus_hash: corpus_hash(corpus),
            swap: report.swap,
            sort: report.sort,
            final_score: report.final_score,
            points: report.final_score.points(),
            verdicts: report.verdicts.clone(),
        }
    }
}

/// SHA-256 over the corpus rows, hex encoded.
pub fn corpus_hash(corpus: &TestCorpus) -> String {
    let mut hasher = Sha256::new();
    for pair in &corpus.swap_cases {
        for v in pair {
            hasher.update(v.to_le_bytes());
        }
    }
    // Separates the tables so rows cannot shift between them unnoticed.
    hasher.update(b"sort");
    for row in &corpus.sort_cases {
        hasher.update((row.len() as u64).to_le_bytes());
        for v in row {
            hasher.update(v.to_le_bytes());
        }
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
