use crate::{
    RenderArgs, RenderFormat,
    build::{Builder, PageController},
    config::{Config, base_path_from_config},
};

pub async fn run(args: &RenderArgs) -> Result<(), anyhow::Error> {
    let config_path = Config::path_from_arg(args.config_file.as_deref())?;
    let config = Config::load_from_file(&config_path)?;
    let base_path = base_path_from_config(&config_path);

    let builder = Builder::new(config, base_path)?;
    let query = builder.query()?;

    let pipeline = builder.pipeline();
    tracing::debug!(stages = ?pipeline.stage_names(), "rendering document");

    let mut controller = PageController::new();
    controller.render_now(query.document.as_ref(), &pipeline);

    if let Some(error) = controller.error() {
        return Err(anyhow::anyhow!("failed to render document: {error}"));
    }

    let Some(tree) = controller.content() else {
        // Absent document: nothing to print
        return Ok(());
    };

    match args.format {
        RenderFormat::Html => println!("{}", tree.to_html()),
        RenderFormat::Json => println!("{}", serde_json::to_string_pretty(tree)?),
    }

    Ok(())
}
