use std::path::Path;

use crate::{
    InitArgs,
    config::{
        Config, DEFAULT_CONFIG_FILE, DevConfig, HighlightConfig, MarkdownConfig, PageConfig,
        SiteConfig, ThemeConfig, TocConfig,
    },
};

const STARTER_DOCUMENT: &str = "\
---
title: Welcome
description: A page rendered by pagewright
---

# Welcome

Edit `content/index.md` and run `pagewright serve` to see changes live.

## Contents

## Getting started

```rust
fn main() {
    println!(\"hello\");
}
```
";

pub async fn run(args: &InitArgs) -> Result<(), anyhow::Error> {
    let path = if args.path.is_relative() {
        std::env::current_dir()?.join(&args.path)
    } else {
        args.path.clone()
    };

    if !path.exists() {
        if args.create {
            tokio::fs::create_dir_all(&path).await?;
            println!("Created directory {path}", path = path.display());
        } else {
            return Err(anyhow::anyhow!(
                "Directory does not exist: {path}",
                path = path.display()
            ));
        }
    }

    let config_file = path.join(DEFAULT_CONFIG_FILE);
    if config_file.exists() {
        return Err(anyhow::anyhow!(
            "Config file already exists: {config_file}",
            config_file = config_file.display()
        ));
    }

    println!("Initializing project in {}", path.display());

    let config_text = serde_yaml::to_string(&default_config())?;
    tokio::fs::write(&config_file, config_text).await?;
    println!(
        "Created config file {config_file}",
        config_file = config_file.display()
    );

    let page = PageConfig::default();
    write_starter_document(&page.resolve_source(&path)).await?;

    Ok(())
}

fn default_config() -> Config {
    Config {
        site: SiteConfig {
            title: "My Page".into(),
            description: None,
            author: None,
            lang: "en".into(),
            url: None,
            output: "_site".into(),
        },
        page: PageConfig::default(),
        markdown: MarkdownConfig::default(),
        toc: TocConfig::default(),
        highlight: HighlightConfig::default(),
        theme: ThemeConfig::default(),
        dev: DevConfig::default(),
    }
}

async fn write_starter_document(document: &Path) -> Result<(), anyhow::Error> {
    if document.exists() {
        return Ok(());
    }
    if let Some(parent) = document.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(document, STARTER_DOCUMENT).await?;
    println!("Created document {}", document.display());
    Ok(())
}
