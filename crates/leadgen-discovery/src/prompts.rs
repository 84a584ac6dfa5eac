//! Prompt text for each discovery operation.

use leadgen_core::{BrandSearchPreference, DraftKind, Lead, TargetPreference};

pub(crate) fn discovery_prompt(query: &str, pref: &BrandSearchPreference) -> String {
    let category = match pref.target_type {
        TargetPreference::Both => "Both (provide a mix of B2B and D2C)".to_string(),
        other => other.to_string(),
    };
    format!(
        "Find 8 high-quality, relevant brands launched recently or trending on Product Hunt.\n\
         Focus on products that align with: {query}.\n\
         Preferred Category: {category}.\n\
         Niche focus: {niche}.\n\
         \n\
         CRITICAL: Only include brands with active websites.\n\
         \n\
         Return the result as a JSON array of objects.\n\
         JSON structure: [{{ name, tagline, website, description, industry, targetType, sourceUrl, isPhVerified, isActive }}]\n\
         The \"targetType\" field MUST be either \"B2B\" or \"D2C\".\n\
         Only return the raw JSON array.",
        niche = pref.niche,
    )
}

pub(crate) fn lookup_prompt(brand_name: &str) -> String {
    format!(
        "Find the official brand details for a company named \"{brand_name}\".\n\
         I need their official website, current tagline, a one-sentence description, \
         their primary industry, and whether they are \"B2B\" or \"D2C\".\n\
         Return the result as a JSON object.\n\
         JSON structure: {{ name, tagline, website, description, industry, targetType, sourceUrl, isPhVerified, isActive }}"
    )
}

pub(crate) fn contact_prompt(brand_name: &str, website: &str) -> String {
    format!(
        "Locate a direct contact email AND the specific person's name (founder, marketing lead, \
         or growth lead) for \"{brand_name}\" ({website}).\n\
         Check LinkedIn, Product Hunt about sections, and their team pages.\n\
         Return a JSON object with keys: name, email, and source."
    )
}

pub(crate) fn draft_prompt(lead: &Lead, sender_name: &str, kind: DraftKind) -> String {
    let context = match kind {
        DraftKind::FollowUp => {
            "This is a FOLLOW-UP email. I am including a funny meme as an icebreaker. \
             Keep the text very short and acknowledge the humor."
        }
        DraftKind::Initial => {
            "This is an INITIAL cold outreach email. You found them because they were on Product Hunt."
        }
    };
    let contact = lead
        .contact_name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or("Marketing Team");
    let sender = if sender_name.trim().is_empty() {
        "a creator"
    } else {
        sender_name
    };

    format!(
        "{context}\n\
         \n\
         Write a short, punchy email for a UGC creator reaching out to \"{name}\".\n\
         \n\
         Brand Context: {tagline}\n\
         Brand Description: {description}\n\
         Contact Person: {contact}\n\
         My name: {sender}\n\
         \n\
         Tone: Enthusiastic, professional, human.\n\
         Max length: 120 words.\n\
         \n\
         CRITICAL WORDING: You MUST include this specific phrasing or very similar: \
         \"huge congrats for being on product launch it's actually how I found you guys\". \
         Use it naturally as the reason you are reaching out.\n\
         \n\
         CRITICAL: You MUST NOT include a \"Subject:\" line. Start directly with the greeting.",
        name = lead.name,
        tagline = lead.tagline,
        description = lead.description,
    )
}
