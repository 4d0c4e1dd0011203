use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

/// Lowercased names of the immediate children of a project directory.
#[derive(Debug, Clone, Default)]
pub struct DirListing {
    pub files: HashSet<String>,
    pub dirs: HashSet<String>,
}

impl DirListing {
    pub fn read(path: &Path) -> Self {
        let mut listing = Self::default();
        let Ok(entries) = fs::read_dir(path) else {
            return listing;
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if entry.path().is_dir() {
                listing.dirs.insert(name);
            } else {
                listing.files.insert(name);
            }
        }
        listing
    }

    fn has_file(&self, name: &str) -> bool {
        self.files.contains(name)
    }

    fn has_dir(&self, name: &str) -> bool {
        self.dirs.contains(name)
    }

    fn file_with_prefix(&self, prefix: &str) -> bool {
        self.files.iter().any(|name| name.starts_with(prefix))
    }

    fn file_with_suffix(&self, suffix: &str) -> bool {
        self.files.iter().any(|name| name.ends_with(suffix))
    }

    fn dir_with_suffix(&self, suffix: &str) -> bool {
        self.dirs.iter().any(|name| name.ends_with(suffix))
    }

    fn file_with_prefix_suffix(&self, prefix: &str, suffix: &str) -> bool {
        self.files
            .iter()
            .any(|name| name.starts_with(prefix) && name.ends_with(suffix))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectSignals {
    pub techs: Vec<String>,
    pub ides: Vec<String>,
    pub project_type: String,
}

pub fn detect_project_signals(path: &Path) -> ProjectSignals {
    let listing = DirListing::read(path);
    let ides = detect_ides(&listing);
    let techs = detect_techs(path, &listing);
    let project_type = detect_project_type(&listing, &techs).to_string();
    ProjectSignals {
        techs: techs.into_iter().collect(),
        ides: ides.into_iter().collect(),
        project_type,
    }
}

fn detect_ides(listing: &DirListing) -> BTreeSet<String> {
    let mut ides = BTreeSet::new();
    if listing.has_dir(".vscode") || listing.file_with_suffix(".code-workspace") {
        ides.insert("vscode".to_string());
    }
    if listing.has_dir(".idea") {
        ides.insert("jetbrains".to_string());
    }
    if listing.has_dir(".vs") || listing.file_with_suffix(".sln") {
        ides.insert("visualstudio".to_string());
    }
    if listing.dir_with_suffix(".xcodeproj") || listing.dir_with_suffix(".xcworkspace") {
        ides.insert("xcode".to_string());
    }
    ides
}

fn detect_techs(path: &Path, listing: &DirListing) -> BTreeSet<String> {
    let mut techs = BTreeSet::new();
    let mut add = |id: &str| {
        techs.insert(id.to_string());
    };

    if listing.has_file("package.json") {
        add("node");
        for id in detect_js_stack(path) {
            add(id);
        }
    }

    const CONFIG_PREFIXES: [(&str, &str); 5] = [
        ("vite.config.", "vite"),
        ("next.config.", "nextjs"),
        ("nuxt.config.", "nuxt"),
        ("svelte.config.", "svelte"),
        ("astro.config.", "astro"),
    ];
    for (prefix, id) in CONFIG_PREFIXES {
        if listing.file_with_prefix(prefix) {
            add(id);
        }
    }

    if listing.has_file("angular.json") {
        add("angular");
    }
    if listing.file_with_prefix_suffix("tsconfig", ".json") {
        add("typescript");
    }
    if listing.has_file("jsconfig.json") {
        add("javascript");
    }
    if listing.has_file("deno.json") || listing.has_file("deno.jsonc") {
        add("deno");
    }
    if listing.has_file("bun.lockb") {
        add("bun");
    }
    if listing.has_file("cargo.toml") {
        add("rust");
    }
    if listing.has_dir("src-tauri") || listing.has_file("tauri.conf.json") {
        add("tauri");
        add("rust");
    }
    if listing.has_file("go.mod") {
        add("go");
    }
    if ["pyproject.toml", "requirements.txt", "pipfile", "setup.py", "setup.cfg"]
        .iter()
        .any(|name| listing.has_file(name))
    {
        add("python");
    }
    if ["pom.xml", "build.gradle", "settings.gradle"]
        .iter()
        .any(|name| listing.has_file(name))
    {
        add("java");
    }
    if listing.has_file("build.gradle.kts") || listing.has_file("settings.gradle.kts") {
        add("java");
        add("kotlin");
    }
    if [".csproj", ".fsproj", ".vbproj", ".sln"]
        .iter()
        .any(|suffix| listing.file_with_suffix(suffix))
    {
        add("dotnet");
    }
    if listing.has_file("gemfile") {
        add("ruby");
    }
    if listing.has_file("composer.json") {
        add("php");
    }
    if listing.has_file("mix.exs") {
        add("elixir");
    }
    if listing.has_file("pubspec.yaml") {
        add("dart");
        if pubspec_declares_flutter(path) {
            add("flutter");
        }
    }
    if listing.has_file("cmakelists.txt")
        || [".cpp", ".cxx", ".cc", ".hpp"]
            .iter()
            .any(|suffix| listing.file_with_suffix(suffix))
    {
        add("cpp");
    }
    if listing.file_with_suffix(".c") || listing.file_with_suffix(".h") {
        add("c");
    }

    if listing.has_file("package.json") && !techs.contains("typescript") {
        techs.insert("javascript".to_string());
    }
    techs
}

fn detect_js_stack(path: &Path) -> Vec<&'static str> {
    let Ok(contents) = fs::read_to_string(path.join("package.json")) else {
        return Vec::new();
    };
    let Ok(manifest) = serde_json::from_str::<Value>(&contents) else {
        return Vec::new();
    };

    let deps = manifest.get("dependencies").and_then(Value::as_object);
    let dev_deps = manifest.get("devDependencies").and_then(Value::as_object);
    let has_dep = |name: &str| {
        deps.is_some_and(|map| map.contains_key(name))
            || dev_deps.is_some_and(|map| map.contains_key(name))
    };

    const DEPENDENCY_TECHS: [(&[&str], &str); 14] = [
        (&["typescript"], "typescript"),
        (&["react", "react-dom"], "react"),
        (&["next"], "nextjs"),
        (&["vue"], "vue"),
        (&["nuxt", "nuxt3"], "nuxt"),
        (&["svelte", "@sveltejs/kit"], "svelte"),
        (&["@angular/core"], "angular"),
        (&["solid-js", "solid-start"], "solid"),
        (&["vite"], "vite"),
        (&["astro"], "astro"),
        (&["electron"], "electron"),
        (&["tauri", "@tauri-apps/api"], "tauri"),
        (&["react-native"], "react-native"),
        (&["expo"], "expo"),
    ];

    DEPENDENCY_TECHS
        .iter()
        .filter(|(names, _)| names.iter().any(|name| has_dep(name)))
        .map(|(_, id)| *id)
        .collect()
}

fn pubspec_declares_flutter(path: &Path) -> bool {
    fs::read_to_string(path.join("pubspec.yaml")).is_ok_and(|contents| {
        contents
            .lines()
            .any(|line| line.trim_start().starts_with("flutter:"))
    })
}

/// Coarse project category, first matching rule wins.
pub fn detect_project_type<I, S>(listing: &DirListing, techs: I) -> &'static str
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let techs: HashSet<String> = techs.into_iter().map(|id| id.as_ref().to_string()).collect();
    let has = |id: &str| techs.contains(id);

    if listing.has_file("manifest.json") && (has("javascript") || has("typescript")) {
        return "extension";
    }

    if has("tauri") || has("electron") || has("flutter") {
        return "desktop";
    }
    if listing.file_with_suffix(".sln")
        && (listing.file_with_suffix(".csproj")
            || listing.has_dir("wpfapp")
            || listing.has_dir("winforms"))
    {
        return "desktop";
    }

    if has("react-native") || has("expo") || (listing.has_dir("ios") && listing.has_dir("android")) {
        return "mobile";
    }

    if has("unity")
        || listing.file_with_suffix(".unitypackage")
        || (listing.has_dir("assets") && listing.has_dir("projectsettings"))
        || has("unreal")
        || listing.file_with_suffix(".uproject")
    {
        return "game";
    }

    let has_web_frontend = has("react") || has("vue") || has("nextjs");
    let has_backend_stack = has("go")
        || has("rust")
        || has("java")
        || has("php")
        || listing.has_file("docker-compose.yml");
    if has_backend_stack && !has_web_frontend {
        return "server";
    }

    if has_web_frontend || has("svelte") || has("astro") || listing.has_file("index.html") {
        return "web";
    }

    if listing.has_file("package.json") {
        return "library";
    }

    "unknown"
}

#[cfg(test)]
#[path = "../tests/discovery/signals_tests.rs"]
mod tests;
