//! Template rendering.
//!
//! Templates are compiled into the binary and rendered with minijinja's
//! HTML auto-escaping. Backend-supplied markup (corrected text, figure
//! analysis, assistant replies) crosses a trust boundary: it is passed
//! through unescaped only when `render.trust_backend_html` is set.

use minijinja::{context, Environment, HtmlEscape, Value};
use paperai_common::{AnalysisResult, ChatTurn, Sender};
use serde::Serialize;

use crate::error::WebError;
use crate::views::{DashboardState, Notice};

pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, WebError> {
        let mut env = Environment::new();
        env.add_template("base.html", include_str!("../templates/base.html"))?;
        env.add_template("login.html", include_str!("../templates/login.html"))?;
        env.add_template("signup.html", include_str!("../templates/signup.html"))?;
        env.add_template("dashboard.html", include_str!("../templates/dashboard.html"))?;
        Ok(Self { env })
    }

    pub fn render(&self, name: &str, ctx: Value) -> Result<String, WebError> {
        Ok(self.env.get_template(name)?.render(ctx)?)
    }

    pub fn login_page(&self, email: &str, notice: Option<&Notice>) -> Result<String, WebError> {
        self.render("login.html", context! { email, notice })
    }

    pub fn signup_page(&self, form: &SignupEcho<'_>, notice: Option<&Notice>) -> Result<String, WebError> {
        self.render("signup.html", context! { form, notice })
    }

    pub fn dashboard_page(&self, page: &DashboardPage<'_>, state: &DashboardState) -> Result<String, WebError> {
        let analysis = state
            .analysis
            .as_ref()
            .map(|a| AnalysisView::new(a, page.trust_backend_html));
        let turns: Vec<TurnView> = state
            .transcript
            .turns()
            .iter()
            .map(|t| TurnView::new(t, page.trust_backend_html))
            .collect();

        self.render(
            "dashboard.html",
            context! {
                accept => page.accept,
                edit_mode => page.edit_mode,
                notice => state.notice,
                file_name => state.file_name,
                analyzed_at => state.analyzed_at.map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string()),
                analysis,
                turns,
                can_chat => state.can_chat(),
                waiting => state.transcript.is_waiting(),
            },
        )
    }
}

/// Values echoed back into the signup form after a failed submit.
/// Passwords are never echoed.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupEcho<'a> {
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

/// Page-level settings for the dashboard.
pub struct DashboardPage<'a> {
    pub accept: &'a str,
    pub edit_mode: &'a str,
    pub trust_backend_html: bool,
}

#[derive(Serialize)]
struct AnalysisView<'a> {
    original_text: &'a str,
    corrected_html: Value,
    correction_count: usize,
    corrections: &'a [paperai_common::Correction],
    figures: Vec<FigureView<'a>>,
}

impl<'a> AnalysisView<'a> {
    fn new(analysis: &'a AnalysisResult, trusted: bool) -> Self {
        Self {
            original_text: &analysis.original_text,
            corrected_html: backend_markup(&analysis.corrected_text, trusted),
            correction_count: analysis.corrections.len(),
            corrections: &analysis.corrections,
            figures: analysis
                .figures
                .iter()
                .map(|f| FigureView {
                    id: &f.id,
                    image: &f.image,
                    analysis_html: multiline_markup(&f.analysis, trusted),
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct FigureView<'a> {
    id: &'a str,
    image: &'a str,
    analysis_html: Value,
}

#[derive(Serialize)]
struct TurnView {
    sender: Sender,
    typing: bool,
    html: Value,
}

impl TurnView {
    /// User input is always escaped; assistant replies follow the trust
    /// setting.
    fn new(turn: &ChatTurn, trusted: bool) -> Self {
        let trusted = trusted && turn.sender == Sender::Ai;
        Self { sender: turn.sender, typing: turn.typing, html: multiline_markup(&turn.text, trusted) }
    }
}

/// Backend markup, raw when trusted, escaped otherwise.
pub fn backend_markup(raw: &str, trusted: bool) -> Value {
    if trusted {
        Value::from_safe_string(raw.to_string())
    } else {
        Value::from_safe_string(escape(raw))
    }
}

/// Like [`backend_markup`], with newlines turned into `<br>`.
pub fn multiline_markup(raw: &str, trusted: bool) -> Value {
    let body = if trusted { raw.to_string() } else { escape(raw) };
    Value::from_safe_string(body.replace("\r\n", "\n").replace('\n', "<br>"))
}

fn escape(raw: &str) -> String {
    HtmlEscape(raw).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperai_common::{Correction, Figure, Transcript};
    use pretty_assertions::assert_eq;

    const PAGE: DashboardPage<'static> = DashboardPage {
        accept: ".pdf,.txt",
        edit_mode: "minimal",
        trust_backend_html: true,
    };

    fn state_with(corrections: usize, figures: usize) -> DashboardState {
        let analysis = AnalysisResult {
            session_id: "s1".into(),
            original_text: "Teh <cat>".into(),
            corrected_text: "<p>The cat</p>".into(),
            corrections: (0..corrections)
                .map(|i| Correction { original: format!("bad{i}"), corrected: format!("good{i}") })
                .collect(),
            figures: (0..figures)
                .map(|i| Figure {
                    id: i.to_string(),
                    image: format!("https://x/{i}.png"),
                    analysis: "first\nsecond".into(),
                })
                .collect(),
        };
        let mut state = DashboardState::default();
        state.apply_upload("paper.pdf", Ok(analysis));
        state
    }

    #[test]
    fn test_multiline_markup() {
        assert_eq!(multiline_markup("a\nb", true).to_string(), "a<br>b");
        assert_eq!(multiline_markup("<i>a\r\nb", false).to_string(), "&lt;i&gt;a<br>b");
    }

    #[test]
    fn test_backend_markup_trust_boundary() {
        assert_eq!(backend_markup("<em>x</em>", true).to_string(), "<em>x</em>");
        let escaped = backend_markup("<em>x</em>", false).to_string();
        assert!(escaped.starts_with("&lt;em&gt;x&lt;"));
        assert!(!escaped.contains('<'));
    }

    #[test]
    fn test_corrections_warning_counts_and_orders() {
        let templates = Templates::new().unwrap();
        let html = templates.dashboard_page(&PAGE, &state_with(3, 0)).unwrap();
        assert!(html.contains("Found 3 spelling/grammar issues:"));
        let positions: Vec<usize> = (0..3).map(|i| html.find(&format!("bad{i}")).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(html.contains("<p>The cat</p>"));
        assert!(html.contains("Teh &lt;cat&gt;"));
    }

    #[test]
    fn test_no_corrections_no_warning() {
        let templates = Templates::new().unwrap();
        let html = templates.dashboard_page(&PAGE, &state_with(0, 0)).unwrap();
        assert!(!html.contains("spelling/grammar issues"));
        assert!(!html.contains("Figure Analysis"));
    }

    #[test]
    fn test_figures_render_with_line_breaks() {
        let templates = Templates::new().unwrap();
        let html = templates.dashboard_page(&PAGE, &state_with(0, 2)).unwrap();
        assert!(html.contains("Figure Analysis"));
        assert!(html.contains(r#"alt="Figure 1""#));
        assert!(html.contains("first<br>second"));
    }

    #[test]
    fn test_untrusted_mode_escapes_backend_html() {
        let templates = Templates::new().unwrap();
        let page = DashboardPage { trust_backend_html: false, ..PAGE };
        let html = templates.dashboard_page(&page, &state_with(1, 0)).unwrap();
        assert!(html.contains("&lt;p&gt;The cat&lt;"));
        assert!(!html.contains("<p>The cat</p>"));
    }

    #[test]
    fn test_user_turns_always_escaped() {
        let mut state = state_with(0, 0);
        state.transcript = Transcript::new();
        let ticket = state.begin_chat("<script>alert(1)</script>");
        assert!(ticket.is_some());
        let templates = Templates::new().unwrap();
        let html = templates.dashboard_page(&PAGE, &state).unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("Thinking..."));
    }

    #[test]
    fn test_empty_dashboard_has_upload_form_only() {
        let templates = Templates::new().unwrap();
        let html = templates.dashboard_page(&PAGE, &DashboardState::default()).unwrap();
        assert!(html.contains(r#"accept=".pdf,.txt""#));
        assert!(!html.contains("Original Text"));
    }
}
