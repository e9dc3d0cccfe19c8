//! HTML rendering for the consultation page.

use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::consultation::{
    AgeGroup, AssistantReply, BloodPressure, ConsultationRequest, DurationDays, Gender, Severity,
    Symptom, Temperature,
};
use crate::session::{FormSession, Phase};

pub const TITLE: &str = "MediGenie: AI Health Assistant";
pub const IDLE_MESSAGE: &str =
    "Please fill in the patient details on the sidebar and click 'Get Recommendation'.";
pub const FOOTER: &str = "Powered by Google Gemini API";

const STYLE: &str = r#"
body { margin: 0; font-family: system-ui, sans-serif; display: flex; min-height: 100vh; }
aside { width: 20rem; padding: 1.5rem; background: #f0f2f6; }
aside label { display: block; margin-top: 1rem; font-weight: 600; }
aside select, aside input[type=number], aside input[type=range] { width: 100%; }
main { flex: 1; padding: 1.5rem 3rem; }
.columns { display: grid; grid-template-columns: 1fr 2fr; gap: 2rem; }
.info { background: #e8f0fe; padding: 1rem; border-radius: .5rem; }
.error { background: #fde8e8; color: #8a1c1c; padding: 1rem; border-radius: .5rem; }
.reply { white-space: pre-wrap; }
.caption { color: #6b7280; font-size: .85rem; }
#spinner { font-style: italic; }
"#;

/// Renders the whole page for the current session state.
pub fn page(session: &FormSession) -> String {
    page_with_notice(session, None)
}

/// Renders the page with an error notice above the main panel, used when the
/// submitted form could not be read.
pub fn page_with_notice(session: &FormSession, notice: Option<&str>) -> String {
    let mut html = String::with_capacity(8 * 1024);
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>MediGenie AI Health Assistant</title>\n<style>{STYLE}</style>\n</head>\n<body>\n"
    );
    html.push_str(&sidebar(session.current()));
    html.push_str("<main>\n");
    let _ = writeln!(html, "<h1>{} 🤖</h1>\n<hr>", TITLE);

    if let Some(notice) = notice {
        let _ = writeln!(html, "<div class=\"error\">{}</div>", text(notice));
    }

    match session.render_state() {
        Phase::Idle => {
            let _ = writeln!(html, "<div class=\"info\">{}</div>", text(IDLE_MESSAGE));
        }
        Phase::Responded { request, outcome } => {
            html.push_str(&responded(request, outcome));
        }
    }

    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn responded(request: &ConsultationRequest, outcome: &Result<AssistantReply, String>) -> String {
    let mut html = String::from("<div class=\"columns\">\n<section>\n");
    html.push_str("<h3>Entered Patient Details</h3>\n<ul>\n");
    for (label, value) in details(request) {
        let _ = writeln!(html, "<li><em>{}:</em> {}</li>", label, text(&value));
    }
    html.push_str("</ul>\n</section>\n<section>\n");

    match outcome {
        Ok(reply) => {
            html.push_str("<h3>AI Recommendation</h3>\n");
            let _ = writeln!(html, "<div class=\"reply\">{}</div>", text(&reply.text));
        }
        Err(message) => {
            let _ = writeln!(
                html,
                "<div class=\"error\"><strong>Could not get a recommendation.</strong> {}</div>",
                text(message)
            );
        }
    }

    html.push_str("</section>\n</div>\n<hr>\n");
    let _ = writeln!(html, "<p class=\"caption\">{}</p>", FOOTER);
    html
}

/// Label/value pairs echoed back next to the reply.
pub fn details(request: &ConsultationRequest) -> Vec<(&'static str, String)> {
    vec![
        ("Symptoms", request.symptom_list()),
        ("Age Group", request.age_group.to_string()),
        ("Gender", request.gender.to_string()),
        ("Temperature", format!("{}°F", request.temperature)),
        ("Blood Pressure", request.blood_pressure.to_string()),
        ("Duration", format!("{} days", request.duration_days)),
        ("Severity", format!("{}/5", request.severity)),
    ]
}

fn sidebar(current: &ConsultationRequest) -> String {
    let mut html = String::from(
        "<aside>\n<h2>Patient Information</h2>\n\
         <form method=\"post\" action=\"/\" \
         onsubmit=\"document.getElementById('spinner').hidden = false\">\n",
    );

    html.push_str("<label for=\"symptoms\">Symptoms</label>\n");
    html.push_str(
        "<select id=\"symptoms\" name=\"symptoms\" multiple size=\"10\" \
         title=\"Select all that apply\">\n",
    );
    for symptom in Symptom::ALL {
        option(&mut html, symptom.label(), current.symptoms.contains(&symptom));
    }
    html.push_str("</select>\n");

    html.push_str("<label for=\"age_group\">Age Group</label>\n<select id=\"age_group\" name=\"age_group\">\n");
    for age in AgeGroup::ALL {
        option(&mut html, age.label(), *age == current.age_group);
    }
    html.push_str("</select>\n");

    html.push_str("<label>Gender</label>\n");
    for gender in Gender::ALL {
        let _ = writeln!(
            html,
            "<input type=\"radio\" id=\"gender-{v}\" name=\"gender\" value=\"{v}\"{checked}> \
             <span>{v}</span>",
            v = attr(gender.label()),
            checked = if *gender == current.gender { " checked" } else { "" },
        );
    }

    let _ = writeln!(
        html,
        "<label for=\"temperature\">Temperature (°F)</label>\n\
         <input type=\"range\" id=\"temperature\" name=\"temperature\" min=\"{min}\" max=\"{max}\" \
         step=\"{step}\" value=\"{value}\" \
         oninput=\"this.nextElementSibling.value = Number(this.value).toFixed(1)\">\
         <output>{value}</output>",
        min = Temperature::MIN,
        max = Temperature::MAX,
        step = Temperature::STEP,
        value = current.temperature,
    );

    html.push_str(
        "<label for=\"blood_pressure\">Blood Pressure Level</label>\n\
         <select id=\"blood_pressure\" name=\"blood_pressure\">\n",
    );
    for level in BloodPressure::ALL {
        option(&mut html, level.label(), *level == current.blood_pressure);
    }
    html.push_str("</select>\n");

    let _ = writeln!(
        html,
        "<label for=\"duration_days\">Duration of Symptoms (days)</label>\n\
         <input type=\"number\" id=\"duration_days\" name=\"duration_days\" min=\"{}\" max=\"{}\" \
         step=\"1\" value=\"{}\" required>",
        DurationDays::MIN,
        DurationDays::MAX,
        current.duration_days,
    );

    let _ = writeln!(
        html,
        "<label for=\"severity\">Severity (1-5)</label>\n\
         <input type=\"range\" id=\"severity\" name=\"severity\" min=\"{}\" max=\"{}\" step=\"1\" \
         value=\"{value}\" oninput=\"this.nextElementSibling.value = this.value\">\
         <output>{value}</output>",
        Severity::MIN,
        Severity::MAX,
        value = current.severity,
    );

    html.push_str(
        "<p><button type=\"submit\">Get Recommendation</button></p>\n\
         <p id=\"spinner\" hidden>Consulting AI...</p>\n</form>\n</aside>\n",
    );
    html
}

fn option(html: &mut String, value: &str, selected: bool) {
    let _ = writeln!(
        html,
        "<option value=\"{}\"{}>{}</option>",
        attr(value),
        if selected { " selected" } else { "" },
        text(value)
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_page_has_form_and_no_reply() {
        let html = page(&FormSession::new());
        assert!(html.contains(TITLE));
        assert!(html.contains(IDLE_MESSAGE));
        assert!(html.contains("Get Recommendation"));
        assert!(!html.contains("AI Recommendation"));
        assert!(!html.contains("Entered Patient Details"));
        assert!(html.contains("value=\"98.6\""));
        assert!(html.contains("min=\"95.0\" max=\"110.0\" step=\"0.1\""));
    }

    #[test]
    fn details_echo_every_field() {
        let request = ConsultationRequest::default().with_symptoms([Symptom::Nausea, Symptom::Rash]);
        let details = details(&request);
        assert_eq!(details[0], ("Symptoms", "Nausea, Rash".to_string()));
        assert_eq!(details[3], ("Temperature", "98.6°F".to_string()));
        assert_eq!(details[5], ("Duration", "5 days".to_string()));
        assert_eq!(details[6], ("Severity", "3/5".to_string()));
    }

    #[test]
    fn selected_values_are_preserved() {
        let request = ConsultationRequest {
            gender: Gender::Female,
            ..Default::default()
        }
        .with_symptoms([Symptom::LossOfSmell]);
        let html = page(&FormSession::with_request(request));
        assert!(html.contains("<option value=\"Loss of Smell\" selected>"));
        assert!(html.contains("value=\"female\" checked"));
        assert!(!html.contains("value=\"male\" checked"));
    }

    #[test]
    fn reply_text_is_escaped() {
        let reply = AssistantReply::new("m", "<script>alert(1)</script>");
        let html = responded(&ConsultationRequest::default(), &Ok(reply));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains(FOOTER));
    }
}
