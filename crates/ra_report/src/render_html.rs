//! Compact, self-contained HTML report rendered from an embedded minijinja
//! template (no external assets). Autoescaping is on because the template name
//! ends in `.html`.

use minijinja::{context, Environment};

use crate::{ReportError, ReportModel};

const TEMPLATE_NAME: &str = "report.html";

static TEMPLATE: &str = r#"<!doctype html>
<html lang="en"><head><meta charset="utf-8">
<title>{{ m.cover.title }} - {{ m.integrity.result_id }}</title>
<style>
body{font-family:system-ui,-apple-system,Segoe UI,Roboto,Arial,sans-serif;margin:24px}
table{border-collapse:collapse;margin-bottom:16px}
td,th{padding:4px 8px;border-bottom:1px solid #ddd;text-align:left}
.muted{opacity:.8}
.pill{display:inline-block;padding:.2em .6em;border-radius:9999px;background:#eee}
</style></head><body>
<h1>{{ m.cover.title }}</h1>
<p class="muted">Source: {{ m.cover.source }} ({{ m.cover.format }}), {{ m.cover.unit_count }} units</p>
<p><span class="pill">Efficiency ({{ m.summary.headline_metric }}): {{ m.summary.headline_pct }}%</span>
 <span class="pill">Recovery: {{ m.summary.recovery_pct }}%</span>
 <span class="pill">Utilization: {{ m.summary.utilization_pct }}%</span></p>

<h2>Parameters</h2>
<ul>
  <li>Same group only: {{ "yes" if m.params.same_group_only else "no" }}</li>
  <li>Minimum allocation: {{ m.params.min_allocation }}</li>
  <li>Rebalance ordering: {{ "yes" if m.params.rebalance_ordering else "no" }}</li>
  <li>Trail: {{ m.params.trail }}</li>
</ul>

<h2>Summary</h2>
<table>{% for r in m.summary.rows %}<tr><th>{{ r.metric }}</th><td>{{ r.value }}</td></tr>{% endfor %}</table>

{% for t in tables %}
<h2>{{ t.title }}</h2>
{% if t.rows %}
<table><tr>{% for h in t.headers %}<th>{{ h }}</th>{% endfor %}</tr>
{% for row in t.rows %}<tr>{% for c in row %}<td>{{ c }}</td>{% endfor %}</tr>
{% endfor %}</table>
{% else %}<p class="muted">(none)</p>{% endif %}
{% endfor %}

<h2>Integrity</h2>
<p>Engine: {{ m.integrity.engine }}</p>
<p>Result: {{ m.integrity.result_id }} (sha256 {{ m.integrity.result_sha256 }})</p>
<p>Run: {{ m.integrity.run_id }}</p>
<p>Inputs sha256: {{ m.integrity.units_sha256 }}; params sha256: {{ m.integrity.params_sha256 }}</p>
</body></html>
"#;

pub fn render_html(model: &ReportModel) -> Result<String, ReportError> {
    let mut env = Environment::new();
    env.add_template(TEMPLATE_NAME, TEMPLATE)
        .map_err(|e| ReportError::Template(e.to_string()))?;
    let tmpl = env
        .get_template(TEMPLATE_NAME)
        .map_err(|e| ReportError::Template(e.to_string()))?;

    let mut tables = vec![&model.units];
    if let Some(a) = &model.allocations {
        tables.push(a);
    }
    tables.push(&model.groups);

    tmpl.render(context! { m => model, tables => tables })
        .map_err(|e| ReportError::Template(e.to_string()))
}
