//! Step definitions: Gherkin step text resolved to a typed [`StepKind`] and executed
//! against the scenario's [`StepContext`].

pub mod acm;
pub mod performance;
pub mod signin;
pub mod sim;
pub mod support;
pub mod web_form;
pub mod website;

use anyhow::{Context, Result};
use regex::Regex;

use crate::error::StepError;
use crate::runner::context::StepContext;
use performance::Viewport;

/// A step with its arguments extracted
#[derive(Debug, Clone, PartialEq)]
pub enum StepKind {
    // ============ Website ============
    OpenWebsite,
    TitleContains(String),
    MainHeading(String),
    ButtonVisible(String),
    LinkVisible(String),
    ClickNavigation(String),
    TextVisible(String),
    HeadingVisible(String),
    ScrollTo(Vec<String>),
    MentionsAll(Vec<String>),
    MentionsAny { terms: Vec<String>, what: String },
    PartnerLogos,
    OpenFaqs,
    ScrollToFooter,
    ContactEmail(String),

    // ============ Sign in ============
    OpenHomepage,
    ClickSignIn,
    EnterEmail(String),
    EnterPassword(String),
    SubmitSignIn,
    SignedIn,
    SignInExperience,
    ClickDashboard,
    ReachDashboard,
    TrackDashboardLoading,

    // ============ Performance and compatibility ============
    Navigate {
        viewport: Viewport,
        browser: Option<String>,
    },
    PageLoads {
        completely: bool,
    },
    LoadedSuccessfully,
    HttpOk,
    NoServerErrors,
    LoadTimeBelow(u64),
    DesktopLayout,
    LayoutAlignment,
    NoHorizontalScroll,
    MainComponentsVisible,
    RendersWithoutErrors,

    // ============ SIM ============
    WaitForChooseWorkspace,
    SelectElement(String),
    ClickElement(String),
    ClickButton(String),
    ClickNavigationLink(String),
    EnterInvitationEmail(String),
    SubmitForm(String),

    // ============ ACM / ARefresh ============
    AcmNavigationLink(String),
    AcmClickElement(String),
    AcmSelectElement(String),
    AcmNewPageLoaded,
    ClickRefresh,
    RefreshLoaded,

    // ============ Web form ============
    OpenWebForm,
    FillWebForm,
    SubmitWebForm,
    WebFormConfirmation,
}

type Build = fn(&[String]) -> Result<StepKind>;

/// One registered step pattern
pub struct StepDefinition {
    pub pattern: &'static str,
    regex: Regex,
    build: Build,
}

/// Translate a cucumber expression into an anchored regex.
fn expression_to_regex(expression: &str) -> Result<Regex> {
    let mut pattern = String::from("^");
    let mut rest = expression;
    while let Some(start) = rest.find('{') {
        let end = rest[start..]
            .find('}')
            .map(|i| start + i)
            .with_context(|| format!("Unclosed parameter in '{}'", expression))?;
        pattern.push_str(&regex::escape(&rest[..start]));
        pattern.push_str(match &rest[start + 1..end] {
            "string" => r#""([^"]*)""#,
            "int" => r"(-?\d+)",
            "word" => r"(\S+)",
            other => anyhow::bail!("Unknown parameter type {{{}}} in '{}'", other, expression),
        });
        rest = &rest[end + 1..];
    }
    pattern.push_str(&regex::escape(rest));
    pattern.push('$');
    Regex::new(&pattern).with_context(|| format!("Invalid step expression '{}'", expression))
}

fn arg(args: &[String], index: usize) -> String {
    args.get(index).cloned().unwrap_or_default()
}

fn terms(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Every step this suite understands, in match priority order
const BUILTIN: &[(&str, Build)] = &[
    // Website
    ("I am on the Yuba homepage", |_| Ok(StepKind::OpenWebsite)),
    ("I should see the page title contains {string}", |a| Ok(StepKind::TitleContains(arg(a, 0)))),
    ("I should see the main heading {string}", |a| Ok(StepKind::MainHeading(arg(a, 0)))),
    ("I should see the {string} button", |a| Ok(StepKind::ButtonVisible(arg(a, 0)))),
    ("I should see the {string} link", |a| Ok(StepKind::LinkVisible(arg(a, 0)))),
    ("I click on {string} in the navigation", |a| Ok(StepKind::ClickNavigation(arg(a, 0)))),
    ("I should see the {string} section", |a| Ok(StepKind::TextVisible(arg(a, 0)))),
    ("I scroll to the {string} module", |a| Ok(StepKind::ScrollTo(vec![arg(a, 0)]))),
    ("I should see {string} heading", |a| Ok(StepKind::HeadingVisible(arg(a, 0)))),
    ("I should see {string} section", |a| Ok(StepKind::TextVisible(arg(a, 0)))),
    ("I should see options for {string}, {string}, and {string}", |a| {
        Ok(StepKind::MentionsAll(a.to_vec()))
    }),
    ("I should see partner logos displayed", |_| Ok(StepKind::PartnerLogos)),
    ("I scroll to the industry section", |_| {
        Ok(StepKind::ScrollTo(terms(&["Industry", "Agnostic"])))
    }),
    ("I should see multiple industry categories displayed", |_| {
        Ok(StepKind::MentionsAny {
            terms: terms(&["industry"]),
            what: "industry categories".to_string(),
        })
    }),
    (
        "I should see industries like {string}, {string}, {string}, {string}, {string}, {string}, {string}",
        |a| Ok(StepKind::MentionsAll(a.to_vec())),
    ),
    ("I scroll to the Venture Builders section", |_| {
        Ok(StepKind::ScrollTo(terms(&["Venture Builder", "Expert Guidance"])))
    }),
    ("I should see multiple Venture Builder profiles", |_| {
        Ok(StepKind::MentionsAny {
            terms: terms(&["venture builder"]),
            what: "Venture Builder profiles".to_string(),
        })
    }),
    ("I should see {string} option", |a| Ok(StepKind::TextVisible(arg(a, 0)))),
    ("I navigate to the FAQs section", |_| Ok(StepKind::OpenFaqs)),
    ("I should see the question {string}", |a| Ok(StepKind::TextVisible(arg(a, 0)))),
    ("I scroll to the footer", |_| Ok(StepKind::ScrollToFooter)),
    ("I should see footer links for {string}, {string}", |a| {
        Ok(StepKind::MentionsAll(a.to_vec()))
    }),
    ("I should see contact email {string}", |a| Ok(StepKind::ContactEmail(arg(a, 0)))),
    ("I should see copyright information", |_| {
        Ok(StepKind::MentionsAny {
            terms: terms(&["\u{a9}", "copyright", "yuba"]),
            what: "copyright information".to_string(),
        })
    }),
    ("I should see content about Yuba's offerings", |_| {
        Ok(StepKind::MentionsAny {
            terms: terms(&["yuba", "offer"]),
            what: "content about Yuba's offerings".to_string(),
        })
    }),
    ("I should see testimonials from founders", |_| {
        Ok(StepKind::MentionsAny {
            terms: terms(&["founder", "testimonial", "quote"]),
            what: "testimonials from founders".to_string(),
        })
    }),
    // Sign in
    ("I open the Yuba homepage", |_| Ok(StepKind::OpenHomepage)),
    ("I click the Sign In button", |_| Ok(StepKind::ClickSignIn)),
    ("I enter my email {string}", |a| Ok(StepKind::EnterEmail(arg(a, 0)))),
    ("I enter my password {string}", |a| Ok(StepKind::EnterPassword(arg(a, 0)))),
    ("I click the sign in submit button", |_| Ok(StepKind::SubmitSignIn)),
    ("I should be signed in successfully", |_| Ok(StepKind::SignedIn)),
    ("I should see the sign in experience", |_| Ok(StepKind::SignInExperience)),
    ("I click the dashboard navigation button", |_| Ok(StepKind::ClickDashboard)),
    ("I should reach the dashboard workspace page", |_| Ok(StepKind::ReachDashboard)),
    ("the dashboard loading time should be tracked", |_| {
        Ok(StepKind::TrackDashboardLoading)
    }),
    // Performance and compatibility
    ("I navigate to the Yuba website", |_| {
        Ok(StepKind::Navigate {
            viewport: Viewport::Current,
            browser: None,
        })
    }),
    ("I navigate to the Yuba website with desktop viewport", |_| {
        Ok(StepKind::Navigate {
            viewport: Viewport::Desktop,
            browser: None,
        })
    }),
    ("I navigate to the Yuba website using {word}", |a| {
        Ok(StepKind::Navigate {
            viewport: Viewport::Current,
            browser: Some(arg(a, 0)),
        })
    }),
    ("the page loads", |_| Ok(StepKind::PageLoads { completely: false })),
    ("the page loads completely", |_| Ok(StepKind::PageLoads { completely: true })),
    ("the website should load successfully", |_| Ok(StepKind::LoadedSuccessfully)),
    ("the HTTP status code should be 200 OK", |_| Ok(StepKind::HttpOk)),
    ("there should be no server errors", |_| Ok(StepKind::NoServerErrors)),
    ("the page load time should be less than {int} seconds", |a| {
        let secs = arg(a, 0);
        let secs = secs
            .parse()
            .with_context(|| format!("Invalid load time limit '{}'", secs))?;
        Ok(StepKind::LoadTimeBelow(secs))
    }),
    ("the desktop layout should render correctly", |_| Ok(StepKind::DesktopLayout)),
    ("there should be no UI misalignment or overlapping elements", |_| {
        Ok(StepKind::LayoutAlignment)
    }),
    ("there should be no horizontal scrolling", |_| Ok(StepKind::NoHorizontalScroll)),
    ("all main UI components should be visible", |_| Ok(StepKind::MainComponentsVisible)),
    ("the page should render without errors", |_| Ok(StepKind::RendersWithoutErrors)),
    // SIM
    ("I wait for navigation to choose workspace page", |_| {
        Ok(StepKind::WaitForChooseWorkspace)
    }),
    ("I select the element {string}", |a| Ok(StepKind::SelectElement(arg(a, 0)))),
    ("I click the element {string}", |a| Ok(StepKind::ClickElement(arg(a, 0)))),
    ("I click the button {string}", |a| Ok(StepKind::ClickButton(arg(a, 0)))),
    ("I click the navigation link {string}", |a| {
        Ok(StepKind::ClickNavigationLink(arg(a, 0)))
    }),
    ("I enter email {string} in the individual email field", |a| {
        Ok(StepKind::EnterInvitationEmail(arg(a, 0)))
    }),
    ("I click the form submit button {string}", |a| Ok(StepKind::SubmitForm(arg(a, 0)))),
    // ACM / ARefresh
    ("I click the ACM navigation link {string}", |a| {
        Ok(StepKind::AcmNavigationLink(arg(a, 0)))
    }),
    ("I click the ACM element {string}", |a| Ok(StepKind::AcmClickElement(arg(a, 0)))),
    ("I select the ACM element {string}", |a| Ok(StepKind::AcmSelectElement(arg(a, 0)))),
    ("a new page should load for ACM test", |_| Ok(StepKind::AcmNewPageLoaded)),
    ("I click the refresh button", |_| Ok(StepKind::ClickRefresh)),
    ("the page should refresh and load within acceptable time", |_| {
        Ok(StepKind::RefreshLoaded)
    }),
    // Web form
    ("I am on the Selenium web form page", |_| Ok(StepKind::OpenWebForm)),
    ("I provide valid form details", |_| Ok(StepKind::FillWebForm)),
    ("I submit the form", |_| Ok(StepKind::SubmitWebForm)),
    ("I should see a confirmation message", |_| Ok(StepKind::WebFormConfirmation)),
];

/// Compiled step patterns
pub struct StepRegistry {
    definitions: Vec<StepDefinition>,
}

impl StepRegistry {
    pub fn builtin() -> Result<Self> {
        let definitions = BUILTIN
            .iter()
            .map(|(pattern, build)| {
                Ok(StepDefinition {
                    pattern,
                    regex: expression_to_regex(pattern)?,
                    build: *build,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { definitions })
    }

    /// Resolve step text (keyword already stripped) to a step.
    pub fn resolve(&self, text: &str) -> Result<StepKind> {
        let text = text.trim();
        for definition in &self.definitions {
            if let Some(caps) = definition.regex.captures(text) {
                let args: Vec<String> = caps
                    .iter()
                    .skip(1)
                    .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
                    .collect();
                return (definition.build)(&args);
            }
        }
        Err(StepError::Undefined(text.to_string()).into())
    }

    /// Registered expressions, for listing.
    pub fn patterns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.definitions.iter().map(|d| d.pattern)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Execute a resolved step
pub async fn execute(ctx: &mut StepContext, step: &StepKind) -> Result<()> {
    match step {
        StepKind::OpenWebsite => website::open_homepage(ctx).await,
        StepKind::TitleContains(text) => website::title_contains(ctx, text).await,
        StepKind::MainHeading(text) => website::main_heading(ctx, text).await,
        StepKind::ButtonVisible(text) => website::button_visible(ctx, text).await,
        StepKind::LinkVisible(text) => website::link_visible(ctx, text).await,
        StepKind::ClickNavigation(item) => website::click_navigation(ctx, item).await,
        StepKind::TextVisible(text) => website::text_visible(ctx, text).await,
        StepKind::HeadingVisible(text) => website::heading_visible(ctx, text).await,
        StepKind::ScrollTo(texts) => {
            let texts: Vec<&str> = texts.iter().map(String::as_str).collect();
            website::scroll_to_text(ctx, &texts).await
        }
        StepKind::MentionsAll(expected) => website::body_mentions_all(ctx, expected).await,
        StepKind::MentionsAny { terms, what } => {
            let terms: Vec<&str> = terms.iter().map(String::as_str).collect();
            website::body_mentions_any(ctx, &terms, what).await
        }
        StepKind::PartnerLogos => website::partner_logos(ctx).await,
        StepKind::OpenFaqs => website::open_faqs(ctx).await,
        StepKind::ScrollToFooter => website::scroll_to_footer(ctx).await,
        StepKind::ContactEmail(email) => website::contact_email(ctx, email).await,

        StepKind::OpenHomepage => signin::open_homepage(ctx).await,
        StepKind::ClickSignIn => signin::click_sign_in(ctx).await,
        StepKind::EnterEmail(email) => signin::enter_email(ctx, email).await,
        StepKind::EnterPassword(password) => signin::enter_password(ctx, password).await,
        StepKind::SubmitSignIn => signin::submit(ctx).await,
        StepKind::SignedIn => signin::signed_in(ctx).await,
        StepKind::SignInExperience => signin::sign_in_experience(ctx).await,
        StepKind::ClickDashboard => signin::click_dashboard(ctx).await,
        StepKind::ReachDashboard => signin::reach_dashboard(ctx).await,
        StepKind::TrackDashboardLoading => signin::track_dashboard_loading(ctx).await,

        StepKind::Navigate { viewport, browser } => {
            performance::navigate(ctx, *viewport, browser.as_deref()).await
        }
        StepKind::PageLoads { completely } => performance::page_loads(ctx, *completely).await,
        StepKind::LoadedSuccessfully => performance::loaded_successfully(ctx).await,
        StepKind::HttpOk => performance::http_ok(ctx).await,
        StepKind::NoServerErrors => performance::no_server_errors(ctx).await,
        StepKind::LoadTimeBelow(secs) => performance::load_time_below(ctx, *secs).await,
        StepKind::DesktopLayout => performance::desktop_layout(ctx).await,
        StepKind::LayoutAlignment => performance::layout_alignment(ctx).await,
        StepKind::NoHorizontalScroll => performance::no_horizontal_scroll(ctx).await,
        StepKind::MainComponentsVisible => performance::main_components_visible(ctx).await,
        StepKind::RendersWithoutErrors => performance::renders_without_errors(ctx).await,

        StepKind::WaitForChooseWorkspace => sim::wait_for_choose_workspace(ctx).await,
        StepKind::SelectElement(xpath) => sim::select_element(ctx, xpath).await,
        StepKind::ClickElement(xpath) => sim::click_element(ctx, xpath).await,
        StepKind::ClickButton(xpath) => sim::click_button(ctx, xpath).await,
        StepKind::ClickNavigationLink(xpath) => sim::click_navigation_link(ctx, xpath).await,
        StepKind::EnterInvitationEmail(email) => sim::enter_invitation_email(ctx, email).await,
        StepKind::SubmitForm(xpath) => sim::submit_form(ctx, xpath).await,

        StepKind::AcmNavigationLink(xpath) => acm::click_navigation_link(ctx, xpath).await,
        StepKind::AcmClickElement(xpath) => acm::click_element(ctx, xpath).await,
        StepKind::AcmSelectElement(xpath) => acm::select_element(ctx, xpath).await,
        StepKind::AcmNewPageLoaded => acm::new_page_loaded(ctx).await,
        StepKind::ClickRefresh => acm::click_refresh(ctx).await,
        StepKind::RefreshLoaded => acm::refresh_loaded(ctx).await,

        StepKind::OpenWebForm => web_form::open(ctx).await,
        StepKind::FillWebForm => web_form::fill_details(ctx).await,
        StepKind::SubmitWebForm => web_form::submit(ctx).await,
        StepKind::WebFormConfirmation => web_form::confirmation_shown(ctx).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> StepRegistry {
        StepRegistry::builtin().unwrap()
    }

    #[test]
    fn test_expression_to_regex() {
        let re = expression_to_regex("I click the button {string}").unwrap();
        assert_eq!(re.as_str(), r#"^I click the button "([^"]*)"$"#);

        let re = expression_to_regex("less than {int} seconds (desktop)").unwrap();
        assert!(re.is_match("less than 3 seconds (desktop)"));
        assert!(!re.is_match("less than three seconds (desktop)"));

        assert!(expression_to_regex("I see {float}").is_err());
        assert!(expression_to_regex("I see {string").is_err());
    }

    #[test]
    fn test_resolve_extracts_arguments() {
        let registry = registry();
        assert_eq!(
            registry
                .resolve("I click the button \"/html/body/div[2]/button\"")
                .unwrap(),
            StepKind::ClickButton("/html/body/div[2]/button".to_string())
        );
        assert_eq!(
            registry
                .resolve("the page load time should be less than 5 seconds")
                .unwrap(),
            StepKind::LoadTimeBelow(5)
        );
        assert_eq!(
            registry
                .resolve("I navigate to the Yuba website using firefox")
                .unwrap(),
            StepKind::Navigate {
                viewport: Viewport::Current,
                browser: Some("firefox".to_string())
            }
        );
        assert_eq!(
            registry
                .resolve("I should see footer links for \"About\", \"Contact\"")
                .unwrap(),
            StepKind::MentionsAll(vec!["About".to_string(), "Contact".to_string()])
        );
    }

    #[test]
    fn test_similar_patterns_stay_distinct() {
        let registry = registry();
        assert_eq!(
            registry.resolve("the page loads").unwrap(),
            StepKind::PageLoads { completely: false }
        );
        assert_eq!(
            registry.resolve("the page loads completely").unwrap(),
            StepKind::PageLoads { completely: true }
        );
        assert_eq!(
            registry.resolve("I should see the \"FAQ\" section").unwrap(),
            StepKind::TextVisible("FAQ".to_string())
        );
        assert_eq!(
            registry.resolve("I should see \"Our Mission\" heading").unwrap(),
            StepKind::HeadingVisible("Our Mission".to_string())
        );
        assert_eq!(
            registry.resolve("I open the Yuba homepage").unwrap(),
            StepKind::OpenHomepage
        );
        assert_eq!(
            registry.resolve("I am on the Yuba homepage").unwrap(),
            StepKind::OpenWebsite
        );
    }

    #[test]
    fn test_unknown_step_is_undefined() {
        let err = registry().resolve("I dance on the homepage").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StepError>(),
            Some(StepError::Undefined(_))
        ));
    }

    #[test]
    fn test_bundled_features_resolve() {
        let registry = registry();
        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("features");
        let files = crate::runner::collect_feature_files(&dir);
        assert!(!files.is_empty());

        for path in files {
            let feature = crate::parser::yaml::parse_feature_file(&path).unwrap();
            for step in feature.scenarios.iter().flat_map(|s| &s.steps) {
                if let Err(e) = registry.resolve(&step.text) {
                    panic!("{}: {}", path.display(), e);
                }
            }
        }
    }

    #[test]
    fn test_every_pattern_matches_only_itself_first() {
        let registry = registry();
        for (i, definition) in registry.definitions.iter().enumerate() {
            let sample = definition
                .pattern
                .replace("{string}", "\"x\"")
                .replace("{int}", "3")
                .replace("{word}", "chrome");
            let first = registry
                .definitions
                .iter()
                .position(|d| d.regex.is_match(&sample));
            assert_eq!(first, Some(i), "pattern '{}' is shadowed", definition.pattern);
        }
    }
}
