pub fn archived_files(names: &[String]) -> String {
    let mut html = String::from(
        r#"<!DOCTYPE html>
<html>
<head>
<title>Archived Files</title>
</head>
<body>
<h1>Archived Files</h1>
<ul>
"#,
    );
    for name in names {
        html.push_str("<li>");
        html.push_str(&escape(name));
        html.push_str("</li>\n");
    }
    html.push_str(
        r#"</ul>
</body>
</html>
"#,
    );
    html
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
