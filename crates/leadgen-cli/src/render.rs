//! Plain-text rendering of leads for the terminal.

use chrono::{DateTime, Utc};
use leadgen_core::{ensure_absolute_url, Bucket, BucketCounts, Lead, TargetFilter};

const DASH: &str = "\u{2014}";

/// `contactedAt` as shown in listings, e.g. `Mar 4, 2025`.
pub(crate) fn fmt_contacted(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(|| DASH.to_string(), |d| d.format("%b %-d, %Y").to_string())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}

pub(crate) fn counts_line(counts: &BucketCounts) -> String {
    format!(
        "active {}  |  contacted {}  |  follow-up {}  |  archived {}",
        counts.active, counts.contacted, counts.follow_up, counts.archived
    )
}

pub(crate) fn lead_table(
    leads: &[&Lead],
    bucket: Bucket,
    filter: TargetFilter,
    selected: Option<&str>,
) -> String {
    if leads.is_empty() {
        return format!("no leads in {bucket} ({filter})");
    }

    let mut out = format!(
        "  {:<44}{:<24}{:<6}{:<15}{:<14}{}\n",
        "ID", "NAME", "TYPE", "STATUS", "CONTACTED", "WEBSITE"
    );
    for lead in leads {
        let marker = if selected == Some(lead.id.as_str()) { '*' } else { ' ' };
        let target = lead
            .target_type
            .map_or_else(|| DASH.to_string(), |t| t.to_string());
        out.push_str(&format!(
            "{marker} {:<44}{:<24}{:<6}{:<15}{:<14}{}\n",
            lead.id,
            truncate(&lead.name, 22),
            target,
            lead.status.to_string(),
            fmt_contacted(lead.contacted_at),
            ensure_absolute_url(&lead.website),
        ));
    }
    out
}

pub(crate) fn lead_detail(lead: &Lead) -> String {
    let or_dash = |v: Option<&str>| v.filter(|s| !s.is_empty()).unwrap_or(DASH).to_string();

    let mut out = String::new();
    out.push_str(&format!("{} ({})\n", lead.name, lead.id));
    if !lead.tagline.is_empty() {
        out.push_str(&format!("  {}\n", lead.tagline));
    }
    let website = ensure_absolute_url(&lead.website);
    out.push_str(&format!("Website:     {}\n", or_dash(Some(website.as_str()))));
    out.push_str(&format!("Industry:    {}\n", or_dash(Some(lead.industry.as_str()))));
    out.push_str(&format!(
        "Type:        {}\n",
        lead.target_type.map_or_else(|| DASH.to_string(), |t| t.to_string())
    ));
    out.push_str(&format!(
        "Status:      {}{}\n",
        lead.status,
        if lead.is_archived { " (archived)" } else { "" }
    ));
    out.push_str(&format!("Contacted:   {}\n", fmt_contacted(lead.contacted_at)));
    out.push_str(&format!(
        "Contact:     {} <{}>",
        or_dash(lead.contact_name.as_deref()),
        or_dash(lead.contact_email.as_deref())
    ));
    if let Some(source) = lead.contact_name_source.as_deref() {
        out.push_str(&format!(" via {source}"));
    }
    out.push('\n');
    if lead.is_ph_verified {
        out.push_str("Product Hunt: verified\n");
    }
    if !lead.source_url.is_empty() {
        out.push_str(&format!("Source:      {}\n", lead.source_url));
    }
    if let Some(url) = lead.follow_up_asset_url.as_deref() {
        out.push_str(&format!("Asset:       {url}\n"));
    }
    if !lead.description.is_empty() {
        out.push_str(&format!("\n{}\n", lead.description));
    }
    if let Some(draft) = lead.generated_email.as_deref() {
        out.push_str(&format!("\n--- initial draft ---\n{draft}\n"));
    }
    if let Some(draft) = lead.follow_up_email.as_deref() {
        out.push_str(&format!("\n--- follow-up draft ---\n{draft}\n"));
    }
    if !lead.follow_up_logs.is_empty() {
        out.push_str("\nFollow-ups:\n");
        for log in &lead.follow_up_logs {
            let kind = kind_label(log.kind);
            out.push_str(&format!(
                "  {}  {kind}  {}\n",
                fmt_contacted(Some(log.date)),
                log.note.as_deref().unwrap_or("")
            ));
        }
    }
    out
}

fn kind_label(kind: leadgen_core::FollowUpKind) -> &'static str {
    match kind {
        leadgen_core::FollowUpKind::Email => "email",
        leadgen_core::FollowUpKind::Video => "video",
        leadgen_core::FollowUpKind::Mixed => "mixed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use leadgen_core::{LeadCandidate, LeadOrigin, LeadStatus};

    fn lead() -> Lead {
        Lead::from_candidate(
            LeadCandidate {
                name: "Acme".into(),
                tagline: "Rockets".into(),
                website: "https://acme.com".into(),
                description: String::new(),
                industry: "Aerospace".into(),
                target_type: None,
                source_url: String::new(),
                is_ph_verified: false,
                is_active: true,
            },
            LeadOrigin::Discovery,
        )
    }

    #[test]
    fn contacted_date_uses_short_month_format() {
        let at = Utc.with_ymd_and_hms(2025, 3, 4, 15, 0, 0).unwrap();
        assert_eq!(fmt_contacted(Some(at)), "Mar 4, 2025");
        assert_eq!(fmt_contacted(None), DASH);
    }

    #[test]
    fn table_marks_selected_lead() {
        let mut contacted = lead();
        contacted.status = LeadStatus::Contacted;
        contacted.contacted_at = Some(Utc.with_ymd_and_hms(2024, 12, 25, 0, 0, 0).unwrap());
        let id = contacted.id.clone();

        let table = lead_table(&[&contacted], Bucket::Contacted, TargetFilter::All, Some(&id));
        let row = table.lines().nth(1).unwrap();
        assert!(row.starts_with("* "));
        assert!(row.contains("Dec 25, 2024"));
        assert!(row.ends_with("https://acme.com"));
    }

    #[test]
    fn empty_table_names_the_view() {
        assert_eq!(
            lead_table(&[], Bucket::Archive, TargetFilter::D2c, None),
            "no leads in archive (D2C)"
        );
    }

    #[test]
    fn detail_includes_contact_and_drafts() {
        let mut lead = lead();
        lead.contact_name = Some("Jane".into());
        lead.contact_email = Some("jane@acme.com".into());
        lead.contact_name_source = Some("LinkedIn".into());
        lead.generated_email = Some("Hi Jane".into());
        let text = lead_detail(&lead);
        assert!(text.contains("Contact:     Jane <jane@acme.com> via LinkedIn"));
        assert!(text.contains("--- initial draft ---\nHi Jane"));
    }
}
