use chrono::{DateTime, Local};

pub fn render_index(area_codes: &[String], loaded_at: &DateTime<Local>) -> String {
    let options: String = area_codes
        .iter()
        .enumerate()
        .map(|(i, code)| {
            let code = escape_html(code);
            let selected = if i == 0 { " selected" } else { "" };
            format!("<option value=\"{code}\"{selected}>{code}</option>")
        })
        .collect::<Vec<_>>()
        .join("\n          ");

    INDEX_HTML
        .replace("{{AREA_OPTIONS}}", &options)
        .replace("{{LOADED_AT}}", &loaded_at.format("%Y-%m-%d %H:%M").to_string())
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Housing Supply &amp; Demand Visualization</title>
  <script src="https://cdn.plot.ly/plotly-2.35.2.min.js" charset="utf-8"></script>
  <style>
    :root {
      --bg: #f4f6f8;
      --ink: #212529;
      --muted: #6c757d;
      --card: #ffffff;
      --accent: #0d6efd;
      --shadow: 0 12px 32px rgba(33, 37, 41, 0.08);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: system-ui, -apple-system, "Segoe UI", Roboto, sans-serif;
      padding: 24px 18px 48px;
    }

    .container {
      width: min(1400px, 100%);
      margin: 0 auto;
      display: grid;
      gap: 24px;
    }

    h1 {
      text-align: center;
      margin: 0;
      font-size: clamp(1.8rem, 3vw, 2.5rem);
    }

    .subtitle {
      text-align: center;
      margin: 0;
      color: var(--muted);
    }

    .row {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(420px, 1fr));
      gap: 24px;
    }

    .control {
      display: grid;
      gap: 8px;
    }

    label {
      font-weight: 700;
    }

    select {
      width: 100%;
      padding: 8px 10px;
      border: 1px solid #ced4da;
      border-radius: 6px;
      background: white;
      font-size: 1rem;
    }

    select[multiple] {
      min-height: 140px;
    }

    .chart {
      background: var(--card);
      border-radius: 12px;
      box-shadow: var(--shadow);
      min-height: 450px;
    }

    .status {
      min-height: 1.2em;
      color: var(--muted);
      font-size: 0.95rem;
    }

    .status[data-type="error"] {
      color: #c63b2b;
    }

    .hint {
      margin: 0;
      color: var(--muted);
      font-size: 0.9rem;
      text-align: center;
    }
  </style>
</head>
<body>
  <main class="container">
    <h1>Housing Supply &amp; Demand Visualization</h1>
    <p class="subtitle">Select area codes to compare housing supply and waiting list trends over time.</p>

    <section class="row">
      <div class="control">
        <label for="area-dropdown">Select Area Codes:</label>
        <select id="area-dropdown" multiple>
          {{AREA_OPTIONS}}
        </select>
      </div>
    </section>

    <section class="row">
      <div class="control">
        <label for="line-data-dropdown">Select Data Type for Line Chart:</label>
        <select id="line-data-dropdown">
          <option value="total" selected>Total Households</option>
          <option value="pct_change">Percentage Change</option>
          <option value="normalized">Normalized</option>
        </select>
      </div>
      <div class="control">
        <label for="bar-data-dropdown">Select Data Type for Bar Chart:</label>
        <select id="bar-data-dropdown">
          <option value="total" selected>Total Housing Units</option>
          <option value="pct_change">Percentage Change</option>
          <option value="normalized">Normalized</option>
        </select>
      </div>
    </section>

    <section class="row">
      <div id="waiting-line-chart" class="chart"></div>
      <div id="housing-bar-chart" class="chart"></div>
    </section>

    <section class="row">
      <div id="housing-map" class="chart"></div>
      <div id="housing-pie-chart" class="chart"></div>
    </section>

    <div class="status" id="status"></div>
    <p class="hint">Data loaded {{LOADED_AT}} (server time).</p>
  </main>

  <script>
    const areaEl = document.getElementById('area-dropdown');
    const lineModeEl = document.getElementById('line-data-dropdown');
    const barModeEl = document.getElementById('bar-data-dropdown');
    const statusEl = document.getElementById('status');

    let lastAreas = Array.from(areaEl.selectedOptions).map((option) => option.value);

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const selectedAreas = () => Array.from(areaEl.selectedOptions).map((option) => option.value);

    const draw = async (elementId, route, params) => {
      const query = new URLSearchParams(params);
      const res = await fetch(`/api/charts/${route}?${query}`);
      if (!res.ok) {
        const msg = await res.text();
        throw new Error(msg || `Unable to load ${route} chart`);
      }
      const figure = await res.json();
      await Plotly.react(elementId, figure.data, figure.layout, { responsive: true });
    };

    const charts = {
      waiting: () => draw('waiting-line-chart', 'waiting', { areas: lastAreas.join(','), mode: lineModeEl.value }),
      housing: () => draw('housing-bar-chart', 'housing', { areas: lastAreas.join(','), mode: barModeEl.value }),
      map: () => draw('housing-map', 'map', { areas: lastAreas.join(',') }),
      composition: () => draw('housing-pie-chart', 'composition', { areas: lastAreas.join(',') })
    };

    const refresh = (names) => {
      Promise.all(names.map((name) => charts[name]()))
        .then(() => setStatus('', ''))
        .catch((err) => setStatus(err.message, 'error'));
    };

    areaEl.addEventListener('change', () => {
      const areas = selectedAreas();
      if (!areas.length) {
        // At least one area stays selected.
        Array.from(areaEl.options).forEach((option) => {
          option.selected = lastAreas.includes(option.value);
        });
        return;
      }
      lastAreas = areas;
      refresh(['waiting', 'housing', 'map', 'composition']);
    });

    lineModeEl.addEventListener('change', () => refresh(['waiting']));
    barModeEl.addEventListener('change', () => refresh(['housing']));

    if (lastAreas.length) {
      refresh(['waiting', 'housing', 'map', 'composition']);
    } else {
      setStatus('No areas available.', 'error');
    }
  </script>
</body>
</html>
"#;
