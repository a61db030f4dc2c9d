use log::info;
use tokgram_core::io::{build_output_path, list_files, normalize_folder};
use tokgram_core::model::config::TrainingConfig;
use tokgram_core::model::generator::Generator;
use tokgram_core::model::trainer::Trainer;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Log level is read from RUST_LOG (e.g. RUST_LOG=info)
    env_logger::init();

    let folder = normalize_folder("./data");
    if !folder.is_dir() {
        println!("No corpus folder found at {}", folder.display());
        return Ok(());
    }

    // Optional training parameters, defaults otherwise
    let config_path = folder.join("config.json");
    let config = if config_path.exists() {
        TrainingConfig::from_json_file(&config_path)?
    } else {
        TrainingConfig::default()
    };
    info!("Training with {:?}", config);

    let trainer = Trainer::new(config)?;
    let mut rng = rand::rng();

    // One model per corpus, the .bin cache is reused when parameters match
    for file in list_files(&folder, "txt")? {
        let corpus_path = folder.join(&file);
        let model = trainer.load_or_train(&corpus_path)?;

        let json_path = build_output_path(&corpus_path, "json")?;
        model.save_json(&json_path)?;

        println!(
            "{}: {} words ({} skipped), {} contexts, {} end contexts -> {}",
            file,
            model.total_words(),
            model.skipped_words(),
            model.transitions().len(),
            model.end_transitions().len(),
            json_path.display()
        );

        // How a few words are cut into tokens
        let tokenizer = model.tokenizer();
        for word in ["running", "information", "a"] {
            let pieces: Vec<String> = tokenizer.segment(word).into_iter().map(|piece| piece.label).collect();
            println!("  {} -> {}", word, pieces.join(" "));
        }

        // Words sampled from the quantized tables
        let preview = Generator::new(&model).preview_words(10, &mut rng);
        println!("  preview: {}", preview.join(", "));
    }

    Ok(())
}
