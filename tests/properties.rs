use codon_optimizer::{
    DNAsequence, Engine, EngineParameters, OptimizationEngine, ReferenceTables,
    genetic_code::{GeneticCode, GeneticCodes},
    optimizer::OptimizerSettings,
    problem::ProblemState,
};
use proptest::prelude::*;
use std::sync::{Arc, LazyLock};

static TABLES: LazyLock<Arc<ReferenceTables>> =
    LazyLock::new(|| Arc::new(ReferenceTables::builtin().unwrap()));

fn engine(seed: u64) -> OptimizationEngine {
    let parameters = EngineParameters {
        optimizer: OptimizerSettings {
            max_iterations: 2_000,
            max_stagnant_iterations: 200,
            seed,
        },
        ..Default::default()
    };
    OptimizationEngine::new(TABLES.clone(), parameters).unwrap()
}

fn bacterial() -> GeneticCode {
    GeneticCodes::builtin().unwrap().find("Bacterial").unwrap().clone()
}

fn codon() -> impl Strategy<Value = String> {
    (0usize..64).prop_map(|i| String::from_utf8_lossy(&GeneticCode::codon_from_index(i)).to_string())
}

fn codons_only() -> impl Strategy<Value = String> {
    prop::collection::vec(codon(), 1..40).prop_map(|codons| codons.concat())
}

/// Random coding sequences, sprinkled with the default avoided sites.
fn coding_sequence() -> impl Strategy<Value = String> {
    let site = prop_oneof![
        Just("GGTCTC".to_string()),
        Just("GAAGAC".to_string()),
        Just("CGTCTC".to_string()),
        Just("GCGGCCGC".to_string()),
    ];
    let piece = prop_oneof![4 => codon(), 1 => site];
    prop::collection::vec(piece, 1..40).prop_map(|pieces| {
        let mut sequence = pieces.concat();
        // Pad to whole codons
        while sequence.len() % 3 != 0 {
            sequence.push('A');
        }
        sequence
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn translation_preserved(input in coding_sequence()) {
        let result = engine(123).optimize(&input).unwrap();
        let code = bacterial();
        let before = DNAsequence::from_sequence(&input).unwrap().translate(&code);
        let after = DNAsequence::from_sequence(&result.optimized_sequence).unwrap().translate(&code);
        prop_assert_eq!(before, after);
    }

    #[test]
    fn constraints_pass_or_are_listed(input in coding_sequence()) {
        let result = engine(123).optimize(&input).unwrap();
        if result.state == ProblemState::Done {
            prop_assert!(result.report.constraints.iter().all(|c| c.passed()));
            for site in ["GGTCTC", "GAGACC", "GAAGAC", "GTCTTC", "CGTCTC", "GAGACG", "GCGGCCGC"] {
                prop_assert!(!result.optimized_sequence.contains(site));
            }
        } else {
            prop_assert_eq!(result.state, ProblemState::Failed);
            prop_assert!(!result.unresolved.is_empty());
        }
    }

    #[test]
    fn deterministic(input in coding_sequence(), seed in any::<u64>()) {
        let a = engine(seed).optimize(&input).unwrap();
        let b = engine(seed).optimize(&input).unwrap();
        prop_assert_eq!(a.optimized_sequence, b.optimized_sequence);
        prop_assert_eq!(a.constraints_summary, b.constraints_summary);
        prop_assert_eq!(a.objectives_summary, b.objectives_summary);
    }

    #[test]
    fn idempotent(input in coding_sequence()) {
        let first = engine(123).optimize(&input).unwrap();
        prop_assume!(first.state == ProblemState::Done && !first.budget_exhausted);
        let second = engine(99).optimize(&first.optimized_sequence).unwrap();
        prop_assert_eq!(first.optimized_sequence, second.optimized_sequence);
    }

    #[test]
    fn optimizer_never_lowers_resolved_score(input in coding_sequence()) {
        let result = engine(123).optimize(&input).unwrap();
        prop_assume!(result.state == ProblemState::Done);
        let objective = &result.report.objectives[0];
        let resolved = objective.score_resolved.unwrap();
        prop_assert!(objective.score_after >= resolved - 1e-9);
    }

    #[test]
    fn score_never_drops_when_input_satisfies_constraints(input in codons_only()) {
        let engine = engine(123);
        let problem = engine
            .build_problem(DNAsequence::from_sequence(&input).unwrap())
            .unwrap();
        prop_assume!(problem.report().failed_constraints() == 0);
        let result = engine.optimize(&input).unwrap();
        let objective = &result.report.objectives[0];
        prop_assert!(objective.score_after >= objective.score_before);
    }
}
