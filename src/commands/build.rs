use crate::{
    BuildArgs,
    build::Builder,
    config::{Config, base_path_from_config},
};

pub async fn run(args: &BuildArgs) -> Result<(), anyhow::Error> {
    let config_path = Config::path_from_arg(args.config_file.as_deref())?;
    let config = Config::load_from_file(&config_path)?;

    // Get the base path for resolving relative paths
    let base_path = base_path_from_config(&config_path);

    let builder = Builder::new(config, base_path)?;
    let result = builder.build()?;

    let display_output = result
        .output_dir
        .canonicalize()
        .unwrap_or(result.output_dir.clone());
    if result.rendered {
        println!("Built page to {}", display_output.display());
    } else {
        println!(
            "Built page to {} (no document content)",
            display_output.display()
        );
    }

    Ok(())
}
