// Copyright 2025 LLM Calibrate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Built-in probe scripts.
//!
//! Each script imports the ML pipeline, times one fixed workload and prints
//! a single protocol line. On failure it prints `BENCHMARK_ERROR:` and
//! re-raises so the interpreter exits non-zero.
//!
//! Scripts report raw elapsed seconds for their sample size; the runner
//! scales them. The generation probe is the exception: the number of
//! responses is only known inside the script, so it reports per response.

use super::Probe;

/// Placeholder replaced by the quoted model name.
const MODEL_PLACEHOLDER: &str = "__MODEL_NAME__";

const MODEL_LOADING: &str = r#"
import time
import sys
sys.path.append('.')

start_time = time.time()
try:
    from wisent_guard.core.model import Model
    model = Model(__MODEL_NAME__)
    print(f"BENCHMARK_RESULT:{time.time() - start_time}")
except Exception as e:
    print(f"BENCHMARK_ERROR:{e}")
    raise
"#;

const BENCHMARK_EVAL: &str = r#"
import time
import sys
sys.path.append('.')

start_time = time.time()
try:
    from wisent_guard.cli import run_task_pipeline
    run_task_pipeline(
        task_name="truthfulqa_mc",
        model_name=__MODEL_NAME__,
        limit=10,
        steering_mode=False,
        verbose=False,
        allow_small_dataset=True,
        output_mode="likelihoods",
    )
    print(f"BENCHMARK_RESULT:{time.time() - start_time}")
except Exception as e:
    print(f"BENCHMARK_ERROR:{e}")
    raise
"#;

const CLASSIFIER_TRAINING: &str = r#"
import time
import sys
sys.path.append('.')

start_time = time.time()
try:
    from wisent_guard.core.model import Model
    from wisent_guard.core.agent.diagnose.synthetic_classifier_option import create_classifier_from_trait_description
    from wisent_guard.core.agent.budget import set_time_budget

    set_time_budget(5.0)
    model = Model(__MODEL_NAME__)
    # Pair generation, activation extraction and training for one classifier.
    create_classifier_from_trait_description(
        model=model,
        trait_description="accuracy and truthfulness",
        num_pairs=10,
    )
    print(f"BENCHMARK_RESULT:{time.time() - start_time}")
except Exception as e:
    print(f"BENCHMARK_ERROR:{e}")
    raise
"#;

const STEERING: &str = r#"
import time
import sys
sys.path.append('.')

start_time = time.time()
try:
    from wisent_guard.cli import run_task_pipeline
    run_task_pipeline(
        task_name="truthfulqa_mc",
        model_name=__MODEL_NAME__,
        limit=5,
        steering_mode=True,
        steering_method="CAA",
        steering_strength=1.0,
        layer="15",
        verbose=False,
        allow_small_dataset=True,
        output_mode="likelihoods",
    )
    print(f"BENCHMARK_RESULT:{time.time() - start_time}")
except Exception as e:
    print(f"BENCHMARK_ERROR:{e}")
    raise
"#;

const DATA_GENERATION: &str = r#"
import time
import sys
sys.path.append('.')

start_time = time.time()
try:
    from wisent_guard.core.model import Model
    from wisent_guard.core.contrastive_pairs.generate_synthetically import SyntheticContrastivePairGenerator

    model = Model(__MODEL_NAME__)
    generator = SyntheticContrastivePairGenerator(model)
    pair_set = generator.generate_contrastive_pair_set(
        trait_description="accuracy and truthfulness",
        num_pairs=3,
        name="benchmark_test",
    )
    elapsed = time.time() - start_time

    # Each pair holds two generated responses.
    responses = len(pair_set.pairs) * 2
    if responses == 0:
        raise RuntimeError("No pairs were generated during data generation benchmark")
    print(f"BENCHMARK_RESULT:{elapsed / responses}")
except Exception as e:
    print(f"BENCHMARK_ERROR:{e}")
    raise
"#;

/// Script template for `probe`, before model substitution.
pub fn template(probe: Probe) -> &'static str {
    match probe {
        Probe::ModelLoading => MODEL_LOADING,
        Probe::BenchmarkEval => BENCHMARK_EVAL,
        Probe::ClassifierTraining => CLASSIFIER_TRAINING,
        Probe::Steering => STEERING,
        Probe::DataGeneration => DATA_GENERATION,
    }
}

/// Render the script for `probe` against `model_name`.
pub fn render(probe: Probe, model_name: &str) -> String {
    // A JSON string literal is also a valid Python string literal.
    let quoted = serde_json::Value::String(model_name.to_string()).to_string();
    template(probe).replace(MODEL_PLACEHOLDER, &quoted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_script_speaks_the_protocol() {
        for probe in Probe::ALL {
            let script = render(probe, "meta-llama/Llama-3.1-8B-Instruct");
            assert!(script.contains("BENCHMARK_RESULT:"), "{probe}");
            assert!(script.contains("BENCHMARK_ERROR:"), "{probe}");
            assert!(!script.contains(MODEL_PLACEHOLDER), "{probe}");
        }
    }

    #[test]
    fn test_model_name_is_quoted() {
        let script = render(Probe::ModelLoading, "org/model\"x");
        assert!(script.contains(r#"Model("org/model\"x")"#));
    }
}
