// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! HTML shells served for every page route, and the live-reload client.

use crate::config::Config;
use std::path::Path;

/// URL of the live-reload WebSocket.
pub const HMR_PATH: &str = "/__brisk/hmr";

/// URL of the live-reload client script.
pub const HMR_CLIENT_PATH: &str = "/__brisk/hmr-client.js";

/// URL prefix under which the output root is served.
pub const COMPILED_PREFIX: &str = "/compiled";

/// Client script: logs `recompiling`, reloads on `reload`.
pub const HMR_CLIENT_JS: &str = r#"(function () {
  var protocol = window.location.protocol === 'https:' ? 'wss:' : 'ws:';
  var ws = new WebSocket(protocol + '//' + window.location.host + '/__brisk/hmr');

  ws.onopen = function () {
    console.log('[brisk] live reload connected');
  };

  ws.onmessage = function (event) {
    var data;
    try {
      data = JSON.parse(event.data);
    } catch (e) {
      return;
    }
    if (data.type === 'recompiling') {
      console.log('[brisk] Recompiling...');
    }
    if (data.type === 'reload') {
      console.log('[brisk] Reloading after change to ' + data.file);
      window.location.reload();
    }
  };

  ws.onerror = function (error) {
    console.error('[brisk] WebSocket error:', error);
  };

  ws.onclose = function () {
    console.log('[brisk] Connection lost, attempting to reconnect...');
    setTimeout(function () {
      window.location.reload();
    }, 1000);
  };
})();
"#;

/// Compiled module the shell loads as the app entry, relative to the
/// output root. `src/main.jsx` becomes `main.js`.
pub fn compiled_entry(config: &Config) -> String {
    let entry = Path::new(&config.paths.entry);
    let relative = entry
        .strip_prefix(&config.paths.src_dir)
        .unwrap_or(entry)
        .with_extension(brisk::compiler::OUTPUT_EXTENSION);
    relative.to_string_lossy().replace('\\', "/")
}

/// Dev shell. The router script tag is only present when routes exist.
pub fn render_dev_shell(config: &Config, has_router: bool) -> String {
    let mut scripts = format!(
        "  <script type=\"module\" src=\"{}\"></script>\n",
        HMR_CLIENT_PATH
    );
    if has_router {
        scripts.push_str(&format!(
            "  <script type=\"module\" src=\"{}/{}\"></script>\n",
            COMPILED_PREFIX,
            brisk::artifact::ROUTER_FILE
        ));
    }
    scripts.push_str(&format!(
        "  <script type=\"module\" src=\"{}/{}\"></script>\n",
        COMPILED_PREFIX,
        compiled_entry(config)
    ));
    render_shell(config, &format!("{} - Dev", config.meta.title), "", &scripts)
}

/// Production shell referencing the bundled entry chunk and, when the
/// entry imports CSS, its stylesheet.
pub fn render_production_shell(
    config: &Config,
    bundle_entry: &str,
    stylesheet: Option<&str>,
) -> String {
    let links = stylesheet
        .map(|css| {
            format!(
                "  <link rel=\"stylesheet\" href=\"/{}\">\n",
                html_escape(css.trim_start_matches('/'))
            )
        })
        .unwrap_or_default();
    let scripts = format!(
        "  <script type=\"module\" src=\"/{}\"></script>\n",
        bundle_entry.trim_start_matches('/')
    );
    render_shell(config, &config.meta.title, &links, &scripts)
}

fn render_shell(config: &Config, title: &str, links: &str, scripts: &str) -> String {
    let meta = &config.meta;
    let shell = &config.app_shell;

    let mut head = String::new();
    head.push_str(&meta_tag("description", &meta.description));
    head.push_str(&meta_tag("keywords", &meta.keywords));
    head.push_str(&meta_tag("author", &meta.author));
    head.push_str(&meta_tag("theme-color", &meta.theme_color));

    let loading = if shell.loading {
        format!(
            "<div class=\"brisk-loading\">{}</div>",
            html_escape(&shell.loading_text)
        )
    } else {
        String::new()
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
{head}  <title>{title}</title>
{links}
  <style>
    body {{ margin: 0; background: {background}; }}
    .brisk-loading {{ display: flex; align-items: center; justify-content: center; min-height: 100vh; font-family: system-ui, sans-serif; }}
  </style>
</head>
<body>
  <div id="root">{loading}</div>
{scripts}</body>
</html>
"#,
        lang = html_escape(&meta.lang),
        head = head,
        title = html_escape(title),
        links = links,
        background = html_escape(&shell.background_color),
        loading = loading,
        scripts = scripts,
    )
}

fn meta_tag(name: &str, content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }
    format!(
        "  <meta name=\"{}\" content=\"{}\">\n",
        name,
        html_escape(content)
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_tag_only_with_routes() {
        let config = Config::default();
        let with = render_dev_shell(&config, true);
        let without = render_dev_shell(&config, false);
        assert!(with.contains("src=\"/compiled/router.js\""));
        assert!(!without.contains("router.js"));
        assert!(without.contains("src=\"/compiled/main.js\""));
        assert!(without.contains(HMR_CLIENT_PATH));
    }

    #[test]
    fn test_router_loads_before_entry() {
        let html = render_dev_shell(&Config::default(), true);
        let router = html.find("router.js").unwrap();
        let entry = html.find("main.js").unwrap();
        assert!(router < entry);
    }

    #[test]
    fn test_meta_is_escaped_and_empty_tags_omitted() {
        let mut config = Config::default();
        config.meta.title = "Tom & Jerry".to_string();
        config.meta.description = "<script>".to_string();
        let html = render_production_shell(&config, "assets/main-X.js", None);

        assert!(html.contains("<title>Tom &amp; Jerry</title>"));
        assert!(html.contains("content=\"&lt;script&gt;\""));
        assert!(!html.contains("name=\"keywords\""));
        assert!(html.contains("src=\"/assets/main-X.js\""));
        assert!(!html.contains(HMR_CLIENT_PATH));
        assert!(!html.contains("stylesheet"));
    }

    #[test]
    fn test_production_shell_links_stylesheet() {
        let html = render_production_shell(
            &Config::default(),
            "assets/main-X.js",
            Some("assets/main-X.css"),
        );
        let link = html.find("<link rel=\"stylesheet\" href=\"/assets/main-X.css\">").unwrap();
        assert!(link < html.find("</head>").unwrap());
    }

    #[test]
    fn test_loading_placeholder() {
        let mut config = Config::default();
        assert!(render_dev_shell(&config, false).contains("brisk-loading\">Loading...</div>"));
        config.app_shell.loading = false;
        assert!(render_dev_shell(&config, false).contains("<div id=\"root\"></div>"));
    }

    #[test]
    fn test_compiled_entry() {
        let mut config = Config::default();
        assert_eq!(compiled_entry(&config), "main.js");
        config.paths.entry = "src/app/index.tsx".to_string();
        assert_eq!(compiled_entry(&config), "app/index.js");
    }
}
