//! Generate static files

use anyhow::Result;
use notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::content::loader::ContentLoader;
use crate::generator::{BuildReport, Generator};
use crate::Folio;

/// Quiet period before a batch of changes triggers a rebuild
const DEBOUNCE: Duration = Duration::from_millis(500);

/// Load all posts and write the site
pub fn run(site: &Folio) -> Result<BuildReport> {
    let start = Instant::now();

    let posts = ContentLoader::new(site).load_posts()?;
    tracing::info!("Loaded {} posts", posts.len());

    let report = Generator::new(site)?.generate(&posts)?;
    if report.skipped > 0 {
        tracing::warn!("{} posts could not be rendered", report.skipped);
    }

    tracing::info!(
        "Generated {} posts, {} index and {} category pages in {:.2}s",
        report.posts,
        report.index_pages,
        report.category_pages,
        start.elapsed().as_secs_f64()
    );

    Ok(report)
}

/// Whether a batch of changed paths calls for a rebuild. Output under
/// `public_dir` and editor/VCS noise never does.
fn needs_rebuild<'a, I>(paths: I, public_dir: &Path) -> bool
where
    I: IntoIterator<Item = &'a Path>,
{
    paths.into_iter().any(|path| {
        let noise = path.components().any(|c| c.as_os_str() == ".git")
            || path.to_string_lossy().ends_with('~')
            || path.file_name().is_some_and(|n| n == ".DS_Store");
        !noise && !path.starts_with(public_dir)
    })
}

/// Watch sources, layouts and config, regenerating on change until Ctrl-C
pub async fn watch(site: &Folio) -> Result<()> {
    let (tx, mut rx) = mpsc::channel::<DebounceEventResult>(16);

    // Events are batched until the tree has been quiet for DEBOUNCE; a save
    // made during a build arrives as a later batch and triggers another build
    let mut debouncer = new_debouncer(DEBOUNCE, move |res: DebounceEventResult| {
        let _ = tx.blocking_send(res);
    })?;

    if site.source_dir.exists() {
        debouncer
            .watcher()
            .watch(&site.source_dir, RecursiveMode::Recursive)?;
        tracing::debug!("Watching: {:?}", site.source_dir);
    }
    if site.layout_dir.exists() {
        debouncer
            .watcher()
            .watch(&site.layout_dir, RecursiveMode::Recursive)?;
        tracing::debug!("Watching: {:?}", site.layout_dir);
    }
    let config_path = site.base_dir.join("_config.yml");
    if config_path.exists() {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching: {:?}", config_path);
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            batch = rx.recv() => {
                let Some(batch) = batch else { break };
                let events = match batch {
                    Ok(events) => events,
                    Err(e) => {
                        tracing::warn!("Watch error: {}", e);
                        continue;
                    }
                };
                if !needs_rebuild(events.iter().map(|e| e.path.as_path()), &site.public_dir) {
                    continue;
                }

                for event in &events {
                    tracing::debug!("Changed: {:?}", event.path);
                }
                tracing::info!("Change detected, regenerating...");
                // Config edits take effect without restarting
                let rebuilt = Folio::new(&site.base_dir).and_then(|fresh| run(&fresh));
                if let Err(e) = rebuilt {
                    tracing::error!("Generation failed: {:#}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopping watch");
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use std::fs;

    #[test]
    fn test_run_reports_counts() {
        let tmp = tempfile::tempdir().unwrap();
        let posts = tmp.path().join("source/_posts");
        fs::create_dir_all(&posts).unwrap();
        fs::write(
            posts.join("hello.md"),
            "---\ntitle: Hello\ndate: 2024-01-01\ncategories: notes\n---\nHi",
        )
        .unwrap();

        let site = Folio::with_config(tmp.path(), SiteConfig::default());
        let report = run(&site).unwrap();
        assert_eq!(report.posts, 1);
        assert_eq!(report.category_pages, 1);
        assert!(site.public_dir.join("2024/01/01/hello/index.html").exists());
    }

    #[test]
    fn test_needs_rebuild() {
        let public = Path::new("/site/public");
        let changed = |paths: &[&str]| needs_rebuild(paths.iter().map(Path::new), public);

        assert!(changed(&["/site/source/_posts/a.md"]));
        assert!(changed(&["/site/public/index.html", "/site/layouts/post.html"]));
        assert!(!changed(&["/site/public/index.html", "/site/public/page/2/index.html"]));
        assert!(!changed(&["/site/source/.git/index", "/site/source/_posts/a.md~"]));
        assert!(!changed(&["/site/source/.DS_Store"]));
        assert!(!changed(&[]));
    }
}
