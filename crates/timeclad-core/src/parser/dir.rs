//! Directory trees as cladograms: nesting depth becomes time.

use crate::config::Config;
use crate::date::Date;
use crate::error::{Error, Result};
use crate::model::{Cladogram, Node};
use std::path::{MAIN_SEPARATOR, Path};
use walkdir::WalkDir;

/// Builds a cladogram from the directory tree rooted at `root`.
///
/// Every entry becomes a node starting and stopping at `depth.1`, parented to its folder.
/// Files are listed before sub-folders, each group by name. The rendering options that only
/// make sense for this kind of input are applied to `config`.
pub fn parse_dir(root: &Path, config: &mut Config) -> Result<Cladogram> {
    tracing::warn!("directory parsing is experimental");

    let root_name = root
        .to_string_lossy()
        .trim_end_matches(['/', MAIN_SEPARATOR])
        .to_string();
    let show_dot_files = config.dir_show_dot_files != 0;

    let mut clad = Cladogram::new();
    clad.in_vitro = true;
    clad.nodes.push(dir_node(&root_name, "", 0, config));
    let mut deepest = 0;

    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by(|a, b| {
            a.file_type()
                .is_dir()
                .cmp(&b.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        })
        .into_iter()
        .filter_entry(|e| show_dot_files || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
            Error::io(path, source)
        })?;
        let depth = i32::try_from(entry.depth()).unwrap_or(i32::MAX);
        deepest = deepest.max(depth);

        let name = join(&root_name, entry.path().strip_prefix(root).unwrap_or(entry.path()));
        let parent = name
            .rsplit_once(MAIN_SEPARATOR)
            .map(|(parent, _)| parent.to_string())
            .unwrap_or_default();
        let node = if entry.file_type().is_dir() {
            dir_node(&name, &parent, depth, config)
        } else {
            let mut node = dir_node(&name, &parent, depth, config);
            node.color = config.dir_color_file;
            node
        };
        clad.nodes.push(node);
    }

    config.end_of_time = Date::year(deepest + 1);
    config.deriv_type = 1;
    config.stop_fade_out_px = 0;
    config.ruler_month_width = 0;

    tracing::debug!(entries = clad.nodes.len(), deepest, "parsed directory input");
    Ok(clad)
}

fn join(root: &str, rel: &Path) -> String {
    let mut out = root.to_string();
    for part in rel.components() {
        out.push(MAIN_SEPARATOR);
        out.push_str(&part.as_os_str().to_string_lossy());
    }
    out
}

fn dir_node(name: &str, parent: &str, depth: i32, config: &Config) -> Node {
    let when = Date::ym(depth, 1);
    let label = name
        .rsplit_once(MAIN_SEPARATOR)
        .map(|(_, base)| base.to_string())
        .unwrap_or_else(|| name.to_string());
    let mut node = Node::new(name)
        .with_parent(parent)
        .with_span(when, when)
        .with_color(config.dir_color_dir);
    node.description = name.to_string();
    node.label = Some(label);
    node
}
