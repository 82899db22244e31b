//! Shallow project scan used to suggest first documents.

use serde::Serialize;
use std::path::{Path, PathBuf};

const IGNORED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    ".contextvault",
    ".claude",
    "dist",
    "build",
    "target",
    "__pycache__",
    ".venv",
    "venv",
];

const SOURCE_DIRS: &[&str] = &["src", "lib", "app", "pkg", "cmd"];

/// `(manifest, package manager, language)`
const MANIFESTS: &[(&str, &str, Option<&str>)] = &[
    ("package.json", "npm", None),
    ("Cargo.toml", "cargo", Some("Rust")),
    ("go.mod", "go modules", Some("Go")),
    ("requirements.txt", "pip", Some("Python")),
    ("pyproject.toml", "pip", Some("Python")),
    ("Gemfile", "bundler", Some("Ruby")),
];

/// `(npm dependency, framework)`
const NPM_FRAMEWORKS: &[(&str, &str)] = &[
    ("react", "React"),
    ("vue", "Vue"),
    ("next", "Next.js"),
    ("express", "Express"),
    ("fastify", "Fastify"),
];

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectScan {
    pub root: PathBuf,
    pub languages: Vec<String>,
    pub frameworks: Vec<String>,
    pub package_managers: Vec<String>,
    pub config_files: Vec<String>,
    pub source_dirs: Vec<String>,
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

/// Inspect the top level of `root`. Read failures yield an empty scan.
pub fn scan_project(root: &Path) -> ProjectScan {
    let mut scan = ProjectScan {
        root: root.to_path_buf(),
        ..Default::default()
    };

    let Ok(entries) = std::fs::read_dir(root) else {
        return scan;
    };
    let mut entries: Vec<_> = entries.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            if !IGNORED_DIRS.contains(&name.as_str()) && SOURCE_DIRS.contains(&name.as_str()) {
                scan.source_dirs.push(name);
            }
            continue;
        }
        if !file_type.is_file() {
            continue;
        }

        for (manifest, manager, language) in MANIFESTS {
            if name == *manifest {
                push_unique(&mut scan.package_managers, manager);
                if let Some(language) = language {
                    push_unique(&mut scan.languages, language);
                }
            }
        }
        if name == "package.json" {
            for framework in npm_frameworks(&entry.path()) {
                push_unique(&mut scan.frameworks, framework);
            }
        }

        if name == "tsconfig.json" {
            push_unique(&mut scan.languages, "TypeScript");
        }
        if name.ends_with(".js") || name.ends_with(".mjs") {
            push_unique(&mut scan.languages, "JavaScript");
        }

        let dotfile = name.starts_with('.') && name != ".DS_Store";
        let config_ext = [".json", ".yaml", ".yml", ".toml"]
            .iter()
            .any(|ext| name.ends_with(ext));
        if dotfile || config_ext {
            scan.config_files.push(name);
        }
    }

    scan
}

fn npm_frameworks(package_json: &Path) -> Vec<&'static str> {
    let Ok(raw) = std::fs::read_to_string(package_json) else {
        return Vec::new();
    };
    let Ok(pkg) = serde_json::from_str::<serde_json::Value>(&raw) else {
        return Vec::new();
    };
    let Some(deps) = pkg.get("dependencies").and_then(|d| d.as_object()) else {
        return Vec::new();
    };
    NPM_FRAMEWORKS
        .iter()
        .filter(|(dep, _)| deps.contains_key(*dep))
        .map(|(_, framework)| *framework)
        .collect()
}

fn or_none(list: &[String]) -> String {
    if list.is_empty() {
        "None detected".to_string()
    } else {
        list.join(", ")
    }
}

impl ProjectScan {
    pub fn to_markdown(&self) -> String {
        let mut out = format!(
            "# Bootstrap Scan Results\n\n**Project root:** {}\n\n## Detected\n\n",
            self.root.display()
        );
        out += &format!("- **Languages:** {}\n", or_none(&self.languages));
        out += &format!("- **Frameworks:** {}\n", or_none(&self.frameworks));
        out += &format!("- **Package managers:** {}\n", or_none(&self.package_managers));
        out += &format!("- **Config files:** {} found\n", self.config_files.len());
        out += &format!("- **Source directories:** {}\n\n", or_none(&self.source_dirs));

        out += "## Recommendation\n\n";
        out += "Use **ctx_doc** to create documentation for each major component found.\n";
        out += "Use **ctx_doc** with type=\"intel\" to document the architecture and patterns discovered.\n\n";
        out += "### Suggested Documents\n\n";

        let mut n = 1;
        if !self.languages.is_empty() {
            out += &format!(
                "{n}. Architecture doc: tech stack ({}), structure, patterns\n",
                self.languages.join(", ")
            );
            n += 1;
        }
        if !self.frameworks.is_empty() {
            out += &format!(
                "{n}. Framework doc: {} setup and conventions\n",
                self.frameworks.join(", ")
            );
            n += 1;
        }
        out += &format!("{n}. Build/deploy doc: how to build, test, and deploy this project\n");
        out
    }
}
