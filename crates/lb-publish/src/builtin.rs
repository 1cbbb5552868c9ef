//! Layouts used when the template directory does not provide its own.

use lb_core::{TemplateCatalog, TemplateDefinition};

pub const DAY: &str = "simple/day.html";
pub const INDEX: &str = "simple/index.html";
pub const MASTER: &str = "index.html";
pub const LOGGING: &str = "logging/index.html";

/// Day pages, paged report indexes, the master index and the warning report.
pub fn catalog() -> TemplateCatalog {
    TemplateCatalog::new()
        .with(
            ["simple", "day"],
            TemplateDefinition::new(DAY, "{id}/{year}/{month}/{day}.html"),
        )
        .with(["simple", "index"], TemplateDefinition::new(INDEX, "{id}/index.html"))
        .with(
            ["simple", "index_page"],
            TemplateDefinition::new(INDEX, "{id}/page/{page}.html"),
        )
        .with(["index"], TemplateDefinition::new(MASTER, "index.html"))
        .with(["logging", "index"], TemplateDefinition::new(LOGGING, "logging/index.html"))
}

/// Source of a built-in template, by its file name.
pub fn source(name: &str) -> Option<&'static str> {
    match name {
        DAY => Some(DAY_SOURCE),
        INDEX => Some(INDEX_SOURCE),
        MASTER => Some(MASTER_SOURCE),
        LOGGING => Some(LOGGING_SOURCE),
        _ => None,
    }
}

const DAY_SOURCE: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>{{ name }}: {{ report.date }}</title></head>
<body>
<nav>
{% if report.prev %}<a rel="prev" href="{{ report.prev.url }}">{{ report.prev.date }}</a>{% endif %}
<a href="{{ index_url }}">{{ name }}</a>
{% if report.next %}<a rel="next" href="{{ report.next.url }}">{{ report.next.date }}</a>{% endif %}
</nav>
<h1>{{ report.date }}</h1>
{% for entry in report.entries %}
<article>
<h2>{{ entry.time }}{% if entry.metadata.title %} {{ entry.metadata.title }}{% endif %}</h2>
<p>
{%- for activity in entry.activities %}<span class="activity">{{ activity }}</span> {% endfor %}
{%- if entry.metadata.duration_text %}<span class="duration">{{ entry.metadata.duration_text }}</span>{% endif -%}
</p>
{{ entry.body | markdown }}
</article>
{% endfor %}
</body>
</html>
"#;

const INDEX_SOURCE: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>{{ name }}</title></head>
<body>
<h1>{{ name }}</h1>
<p>{{ description }}</p>
<p>{{ min_year }} to {{ max_year }}, at most {{ max_entries }} entries a day</p>
<ul>
{% for report in reports %}<li><a href="{{ report.url }}">{{ report.date }}</a> ({{ report.entry_count }})</li>
{% endfor %}</ul>
{% if page_count > 1 %}<nav>
{% if prev_page %}<a rel="prev" href="{{ prev_page.url }}">Earlier</a>{% endif %}
<span>Page {{ page }} of {{ page_count }}</span>
{% if next_page %}<a rel="next" href="{{ next_page.url }}">Later</a>{% endif %}
</nav>{% endif %}
</body>
</html>
"#;

const MASTER_SOURCE: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>{{ site.title | default("Logbook") }}</title></head>
<body>
<h1>{{ site.title | default("Logbook") }}</h1>
<dl>
{% for report in reports %}<dt><a href="{{ report.url }}">{{ report.name }}</a></dt><dd>{{ report.description }}</dd>
{% endfor %}</dl>
</body>
</html>
"#;

const LOGGING_SOURCE: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>{{ name }}</title></head>
<body>
<h1>{{ name }}</h1>
<table>
{% for record in records %}<tr><td>{{ record.level }}</td><td>{{ record.target }}</td><td>{{ record.message }}</td></tr>
{% endfor %}</table>
</body>
</html>
"#;
