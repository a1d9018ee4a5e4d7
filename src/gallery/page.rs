//! Gallery page rendering

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped inside a single URL path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'\'')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Image Gallery</title>
    <style>
        * {
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }
        body {
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
            background: #f4f5f7;
            color: #222;
            padding: 32px;
        }
        h1 {
            margin-bottom: 24px;
        }
        .grid {
            display: grid;
            grid-template-columns: repeat(auto-fill, minmax(220px, 1fr));
            gap: 16px;
        }
        .card {
            background: white;
            border-radius: 8px;
            padding: 12px;
            box-shadow: 0 2px 6px rgba(0, 0, 0, 0.08);
        }
        .card img {
            width: 100%;
            height: 160px;
            object-fit: cover;
            border-radius: 4px;
        }
        .card p {
            margin: 8px 0;
            font-size: 0.9em;
            word-break: break-all;
        }
        button {
            width: 100%;
            padding: 8px;
            border: none;
            border-radius: 4px;
            background: #4f46e5;
            color: white;
            cursor: pointer;
        }
        #results {
            margin-top: 32px;
        }
        #results img {
            max-width: 30%;
            margin-right: 1%;
        }
        .error {
            color: #b91c1c;
        }
    </style>
</head>
<body>
    <h1>Image Gallery</h1>
"#;

const PAGE_TAIL: &str = r#"    <div id="results"></div>
    <script>
        function encodePath(path) {
            return path.split('/').map(encodeURIComponent).join('/');
        }
        async function processImage(name) {
            const results = document.getElementById('results');
            results.textContent = 'Processing...';
            try {
                const response = await fetch('/process', {
                    method: 'POST',
                    body: new URLSearchParams({ image_name: name }),
                });
                const data = await response.json();
                results.textContent = '';
                if (!response.ok) {
                    const p = document.createElement('p');
                    p.className = 'error';
                    p.textContent = data.error;
                    results.appendChild(p);
                    return;
                }
                for (const url of data.processed_images) {
                    const img = document.createElement('img');
                    img.src = '/static/' + encodePath(url) + '?t=' + Date.now();
                    img.alt = url;
                    results.appendChild(img);
                }
            } catch (e) {
                results.textContent = 'Request failed';
            }
        }
        document.querySelectorAll('button[data-name]').forEach((button) => {
            button.addEventListener('click', () => processImage(button.dataset.name));
        });
    </script>
</body>
</html>
"#;

/// Render the gallery page for `images`
///
/// `images_url` is the URL path under which the images directory is served,
/// e.g. `/static/images`.
pub fn render_gallery_page(images: &[String], images_url: &str) -> String {
    let mut html = String::from(PAGE_HEAD);

    if images.is_empty() {
        html.push_str("    <p>No images found.</p>\n");
    } else {
        html.push_str("    <div class=\"grid\">\n");
        for name in images {
            let src = format!(
                "{}/{}",
                images_url.trim_end_matches('/'),
                utf8_percent_encode(name, PATH_SEGMENT)
            );
            html.push_str(&format!(
                "        <div class=\"card\">\n            <img src=\"{src}\" alt=\"{name}\">\n            <p>{name}</p>\n            <button data-name=\"{name}\">Process</button>\n        </div>\n",
                src = escape_html(&src),
                name = escape_html(name),
            ));
        }
        html.push_str("    </div>\n");
    }

    html.push_str(PAGE_TAIL);
    html
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_every_image() {
        let images = vec!["a.png".to_string(), "b.jpg".to_string()];
        let html = render_gallery_page(&images, "/static/images");

        assert!(html.contains(r#"<img src="/static/images/a.png" alt="a.png">"#));
        assert!(html.contains(r#"<button data-name="b.jpg">"#));
        assert!(!html.contains("No images found"));
    }

    #[test]
    fn test_empty_gallery() {
        let html = render_gallery_page(&[], "/static/images/");
        assert!(html.contains("No images found."));
        assert!(html.ends_with("</html>\n"));
    }

    #[test]
    fn test_names_are_escaped() {
        let images = vec!["my <b>pic</b> & \"co\".png".to_string()];
        let html = render_gallery_page(&images, "/static/images");

        assert!(!html.contains("<b>pic</b>"));
        assert!(html.contains("my &lt;b&gt;pic&lt;/b&gt; &amp; &quot;co&quot;.png"));
        assert!(html.contains("/static/images/my%20%3Cb%3Epic%3C%2Fb%3E%20&amp;%20%22co%22.png"));
    }
}
