use crate::assets::TEMPLATES;
use crate::cache::BuildCache;
use crate::guard::{Hook, RenderScope};
use crate::html::{self, LevelSet};
use crate::options::{self, Params, TocOptions};
use crate::render::{self, TocRenderer};
use crate::{parallel, shortcode};
use anyhow::Result;
use serde::Deserialize;
use std::ffi::OsStr;
use std::num::NonZero;
use std::path::{Path, PathBuf};
use std::{fs, io};
use walkdir::WalkDir;

/// The stylesheet written to the root of every rendered site.
pub const STYLESHEET: &str = "fyptaco.css";

pub struct Context {
    pub src_dir: PathBuf,
    pub config: Config,
    renderer: TocRenderer,
    cache: BuildCache,
}

impl Context {
    pub fn new(src_dir: &Path, config: Config) -> Self {
        Self {
            src_dir: src_dir.into(),
            config,
            renderer: TocRenderer::new(),
            cache: BuildCache::new(),
        }
    }

    /// The content hook: add ids to the headings of a page's main content so
    /// that table-of-contents links resolve.
    ///
    /// Content outside the primary stream, or reached while the hook is
    /// already running for this render, is returned unchanged.
    pub fn add_heading_ids(&self, scope: &RenderScope, content: &str) -> String {
        if !scope.is_primary() {
            return content.to_string();
        }
        let Some(_entered) = scope.enter(Hook::HeadingIds) else {
            return content.to_string();
        };

        let build = self.cache.get_or_build(content, self.config.hook_levels(), &[]);
        build.markup.clone()
    }

    /// Render one embedded table of contents for a page whose original
    /// content is `source`.
    ///
    /// The source is expanded first, so tables of contents nested inside it
    /// (which the guard turns into nothing) do not leak into the heading scan.
    /// Failures are logged and render as nothing.
    pub fn render_shortcode(&self, scope: &RenderScope, params: &Params, source: &str) -> String {
        let Some(_entered) = scope.enter(Hook::Shortcode) else {
            return String::new();
        };
        if source.trim().is_empty() {
            return String::new();
        }

        let options = TocOptions::from_params(&self.config.shortcode_params(params));
        let content =
            shortcode::expand(source, |nested| self.render_shortcode(scope, nested, source));
        let build = self
            .cache
            .get_or_build(&content, options.included, &options.excluded);

        match self
            .renderer
            .render(&build.tree, &options, &render::wrapper_id())
        {
            Ok(out) => out,
            Err(e) => {
                log::warn!("error rendering table of contents: {e}");
                String::new()
            }
        }
    }

    /// Run the content hook and expand embedded tables of contents.
    pub fn render_content(&self, scope: &RenderScope, source: &str) -> String {
        let content = self.add_heading_ids(scope, source);
        shortcode::expand(&content, |params| self.render_shortcode(scope, params, source))
    }

    /// Render the main content of a page.
    pub fn render_page(&self, source: &str) -> String {
        self.render_content(&RenderScope::primary(), source)
    }

    /// Render a single HTML page file to another file.
    fn render_page_to_file(&self, src_path: &Path, dest_path: &Path) -> Result<()> {
        let source = fs::read_to_string(src_path)?;
        fs::write(dest_path, self.render_page(&source))?;
        Ok(())
    }

    /// Given a path that is within `self.src_dir`, produce a mirrored path that
    /// is at the same place is within `dest_dir`.
    ///
    /// Panics if `src` is not within `self.src_dir`.
    fn dest_path(&self, src: &Path, dest_dir: &Path) -> PathBuf {
        let rel_path = src
            .strip_prefix(&self.src_dir)
            .expect("path is within root directory");
        dest_dir.join(rel_path)
    }

    /// List all the resources in the source directory.
    pub fn read_resources(&self) -> impl Iterator<Item = Resource> {
        WalkDir::new(&self.src_dir)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !ignore_filename(e.file_name()))
            .filter_map(|entry| match entry {
                Ok(entry) => {
                    if entry.file_type().is_dir() {
                        Some(Resource::Directory(entry.path().into()))
                    } else if entry.file_type().is_file() {
                        if is_page(entry.path()) {
                            Some(Resource::Page(entry.path().into()))
                        } else {
                            Some(Resource::Static(entry.path().into()))
                        }
                    } else {
                        None
                    }
                }
                Err(e) => {
                    log::warn!("directory walk error: {e}");
                    None
                }
            })
    }

    /// Render all resources in a site to a destination directory. Pages are
    /// rendered on a pool of `threads` workers; a page that fails is reported
    /// and skipped.
    pub fn render_site(&self, threads: Option<NonZero<usize>>, dest_dir: &Path) -> Result<()> {
        remove_dir_force(dest_dir)?;
        fs::create_dir_all(dest_dir)?;

        let threads = threads.unwrap_or_else(parallel::default_threads);
        let render_one = |(src_path, dest_path): (PathBuf, PathBuf)| {
            match self.render_page_to_file(&src_path, &dest_path) {
                Ok(()) => log::debug!("rendered {}", dest_path.display()),
                Err(e) => log::error!("error rendering page {}: {e}", src_path.display()),
            }
        };

        let pages = parallel::run_pool(
            threads,
            threads.get() * 4,
            render_one,
            |pool| -> Result<usize> {
                let mut pages = 0;
                for rsrc in self.read_resources() {
                    match rsrc {
                        Resource::Directory(src_path) => {
                            fs::create_dir_all(self.dest_path(&src_path, dest_dir))?;
                        }
                        Resource::Static(src_path) => {
                            hard_link_or_copy(&src_path, &self.dest_path(&src_path, dest_dir))?;
                        }
                        Resource::Page(src_path) => {
                            let dest_path = self.dest_path(&src_path, dest_dir);
                            pool.send((src_path, dest_path))?;
                            pages += 1;
                        }
                    }
                }
                Ok(pages)
            },
        )?;

        if let Some(css) = TEMPLATES.get("style.css") {
            fs::write(dest_dir.join(STYLESHEET), css)?;
        }
        log::info!("rendered {pages} pages into {}", dest_dir.display());
        Ok(())
    }
}

#[derive(Debug)]
pub enum Resource {
    Static(PathBuf),
    Page(PathBuf),
    Directory(PathBuf),
}

/// Try to hard-link `from` at `to`, falling back to a copy if the link fails
/// (e.g., the two paths are on different filesystems). This always removes the
/// current file at `to`.
fn hard_link_or_copy(from: &Path, to: &Path) -> io::Result<Option<u64>> {
    if to.exists() {
        fs::remove_file(to)?;
    }
    match fs::hard_link(from, to) {
        Ok(_) => Ok(None),
        Err(_) => fs::copy(from, to).map(Some),
    }
}

/// Like `std::fs::remove_dir_all`, but silently succeed if the directory already doesn't exist.
fn remove_dir_force(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
        Ok(()) => Ok(()),
    }
}

/// Should we skip a given file from the rendering process? We skip hidden
/// files (prefixed with .) and ones starting with _, which are special.
pub fn ignore_filename(name: &OsStr) -> bool {
    let bytes = name.as_encoded_bytes();
    (bytes != b"." && bytes.starts_with(b".")) || bytes.starts_with(b"_")
}

/// Does this filename look like an HTML page?
fn is_page(path: &Path) -> bool {
    matches!(path.extension(), Some(e) if e == "html" || e == "htm")
}

/// Defaults for embedded tables of contents, from the `[shortcode]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ShortcodeDefaults {
    min_headings: Option<i64>,
    included: Option<String>,
    excluded: Option<String>,
    title: Option<String>,
    class: Option<String>,
    toggle: Option<bool>,
    default_toggle: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Levels the content hook adds ids to, as `hN` tokens.
    hook_levels: Option<Vec<String>>,
    shortcode: ShortcodeDefaults,
}

impl Config {
    pub fn load(src_dir: &Path) -> Result<Self> {
        match fs::read_to_string(src_dir.join("_config.toml")) {
            // Silently proceed if the file isn't found, but crash on other errors.
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e)?,
            Ok(s) => Ok(toml::from_str(&s)?),
        }
    }

    pub fn hook_levels(&self) -> LevelSet {
        match &self.hook_levels {
            Some(tokens) => options::parse_levels(&tokens.join(",")),
            None => LevelSet::default(),
        }
    }

    /// Fill in configured defaults under the parameters given by a tag.
    pub fn shortcode_params(&self, given: &Params) -> Params {
        let d = &self.shortcode;
        let mut params: Params = [
            ("min_headings", d.min_headings.map(|n| n.to_string())),
            ("included", d.included.clone()),
            ("excluded", d.excluded.clone()),
            ("title", d.title.clone()),
            ("class", d.class.clone()),
            ("toggle", d.toggle.map(|b| b.to_string())),
            ("default_toggle", d.default_toggle.clone()),
        ]
        .into_iter()
        .filter_map(|(k, v)| Some((k.to_string(), v?)))
        .collect();
        params.extend(given.iter().map(|(k, v)| (k.clone(), v.clone())));
        params
    }
}

/// Build a table of contents for one page outside of any site, as the
/// command-line `toc` command does.
pub fn page_toc(source: &str, options: &TocOptions, renderer: &TocRenderer) -> Result<String> {
    let build = html::build(source, options.included, &options.excluded);
    renderer.render(&build.tree, options, &render::wrapper_id())
}
