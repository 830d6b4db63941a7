//! HTML pages: the directory index and the OpenSeadragon slide viewer.

use crate::tile::{DirListing, SlidePage};

/// Escape HTML special characters in user-controlled values.
fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Percent-encode a slide key for use in a URL path, preserving `/`.
fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

// =============================================================================
// Directory Index
// =============================================================================

/// Render the `GET /` directory index.
pub fn render_index(listing: &DirListing) -> String {
    let mut tree = String::new();
    render_listing(listing, &mut tree);

    if tree.is_empty() {
        tree = "<p class=\"empty\">No readable slides found.</p>".to_string();
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Slides</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
               margin: 2rem auto; max-width: 720px; color: #222; }}
        ul {{ list-style: none; padding-left: 1.25rem; }}
        li.dir > span {{ font-weight: 600; }}
        a {{ color: #2552c4; text-decoration: none; }}
        a:hover {{ text-decoration: underline; }}
        .empty {{ color: #777; }}
    </style>
</head>
<body>
    <h1>Slides</h1>
    {tree}
</body>
</html>"#
    )
}

fn render_listing(listing: &DirListing, out: &mut String) {
    if listing.is_empty() {
        return;
    }
    out.push_str("<ul>\n");
    for dir in &listing.directories {
        out.push_str(&format!("<li class=\"dir\"><span>{}</span>\n", html_escape(&dir.name)));
        render_listing(dir, out);
        out.push_str("</li>\n");
    }
    for slide in &listing.slides {
        out.push_str(&format!(
            "<li><a href=\"/{}\">{}</a></li>\n",
            encode_key(&slide.key),
            html_escape(&slide.name)
        ));
    }
    out.push_str("</ul>\n");
}

// =============================================================================
// Slide Viewer
// =============================================================================

/// Render the viewer page for a slide.
///
/// The viewer bootstraps OpenSeadragon from the slide's `.dzi` URL;
/// associated images are linked as additional pseudo-slides, and the
/// physical pixel size is shown when the slide reports one.
pub fn render_slide_page(page: &SlidePage) -> String {
    let escaped_name = html_escape(&page.filename);
    let dzi_url = format!("/{}.dzi", encode_key(&page.key));

    let associated_links = if page.associated.is_empty() {
        String::new()
    } else {
        let items: String = page
            .associated
            .iter()
            .map(|assoc| {
                format!(
                    "<li><a href=\"/{}\">{}</a></li>\n",
                    encode_key(&assoc.key),
                    html_escape(&assoc.name)
                )
            })
            .collect();
        format!("<div class=\"associated\"><h2>Associated images</h2><ul>{items}</ul></div>")
    };

    let mpp_line = page
        .mpp
        .map(|mpp| format!("<div class=\"meta\">{mpp:.4} &micro;m/pixel</div>"))
        .unwrap_or_default();

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{escaped_name}</title>
    <script src="https://cdn.jsdelivr.net/npm/openseadragon@4.1/build/openseadragon.min.js"></script>
    <style>
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        body {{ background: #0f0f0f; font-family: -apple-system, BlinkMacSystemFont,
               'Segoe UI', Roboto, sans-serif; overflow: hidden; }}
        #viewer {{ width: 100vw; height: 100vh; }}
        .info-panel {{ position: absolute; top: 16px; left: 16px; z-index: 1000;
                      background: rgba(0, 0, 0, 0.85); color: #fff; padding: 14px 18px;
                      border-radius: 8px; font-size: 13px; max-width: 320px; }}
        .info-panel h1 {{ font-size: 14px; margin-bottom: 6px; word-break: break-all; }}
        .info-panel .meta {{ color: rgba(255, 255, 255, 0.7); font-size: 12px; }}
        .info-panel .associated h2 {{ font-size: 12px; margin-top: 10px; }}
        .info-panel .associated ul {{ list-style: none; margin-top: 4px; }}
        .info-panel a {{ color: #9db8f0; text-decoration: none; }}
    </style>
</head>
<body>
    <div id="viewer"></div>
    <div class="info-panel">
        <h1>{escaped_name}</h1>
        <div class="meta">{width} &times; {height} px</div>
        {mpp_line}
        {associated_links}
    </div>
    <script>
        OpenSeadragon({{
            id: "viewer",
            prefixUrl: "https://cdn.jsdelivr.net/npm/openseadragon@4.1/build/openseadragon/images/",
            tileSources: "{dzi_url}",
            showNavigator: true,
        }});
    </script>
</body>
</html>"##,
        width = page.width,
        height = page.height,
    )
}

// =============================================================================
// Tests
// =============================================================================
