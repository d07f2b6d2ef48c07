use regress_pipeline::{
    MemoryObjectStore, MonitorOutcome, ObjectStore, Pipeline, PipelineConfig, model_key, synthetic,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Train, persist, detect drift, retrain ===\n");

    // Step 1: Seed an in-memory bucket with two batches of data
    let store = MemoryObjectStore::new();
    let initial = synthetic::linear(100, 2.0, 3.0, 0.5, 1)?;
    let shifted = synthetic::linear(100, -1.5, 20.0, 0.5, 2)?;
    store.put("data/initial.csv", &synthetic::to_csv(&initial)?)?;
    store.put("data/shifted.csv", &synthetic::to_csv(&shifted)?)?;

    let pipeline = Pipeline::new(&store, PipelineConfig::default());
    let v1 = model_key("params", 1);
    let v2 = model_key("params", 2);

    // Step 2: Split, fit, score and save the first generation
    let report = pipeline.train("data/initial.csv", &v1)?;
    println!("Generation 1 ({}):", report.key);
    println!("  Slope: {:.4}", report.model.slope());
    println!("  Intercept: {:.4}", report.model.intercept());
    println!("  Training R² score: {:.4}", report.train.r2);
    println!("  Test R² score: {:.4}", report.test.r2);

    // Step 3: Reload it and check it against the new batch
    let reloaded = pipeline.load_model(&v1)?;
    let new_data = pipeline.load_dataset("data/shifted.csv")?;
    println!(
        "\nReloaded model scores R² {:.4} on data/shifted.csv",
        reloaded.score(&new_data)?
    );

    // Step 4: Let the retrain policy decide
    match pipeline.monitor(&v1, "data/shifted.csv", &v2)? {
        MonitorOutcome::Adequate { score } => {
            println!("Model still adequate (R² {score:.4})");
        }
        MonitorOutcome::Retrained { report, .. } => {
            println!("\nGeneration 2 ({}):", report.key);
            println!("  Slope: {:.4}", report.model.slope());
            println!("  Intercept: {:.4}", report.model.intercept());
            println!("  Test R² score: {:.4}", report.test.r2);
        }
    }

    println!("\nStored objects: {:?}", store.keys());
    Ok(())
}
