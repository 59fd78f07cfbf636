//! RSS 2.0 feed generation.
//!
//! Records are serialized read-only; the only derivation that happens here
//! is the entry identifier:
//!
//! - `pub_date` present → `link#YYYYMMDD`, not a permalink (the anchor is a
//!   disambiguator, not a dereferenceable URL)
//! - `pub_date` absent, link present → the link itself, as a permalink
//! - neither → a deterministic name-based UUID over `base_url|title`,
//!   rendered as a URN
//!
//! The pipeline always populates `link` with at least the base URL, so the
//! last branch is a guard rather than an expected path.

use std::error::Error;
use std::io::Write;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::info;
use uuid::Uuid;

use crate::config::SiteConfig;
use crate::models::Record;

/// Derive the entry identifier and its permalink flag for one record.
pub(crate) fn entry_guid(record: &Record, base_url: &str) -> (String, bool) {
    match (record.pub_date, record.link.is_empty()) {
        (Some(date), link_empty) => {
            let anchor = if link_empty { base_url } else { record.link.as_str() };
            (format!("{}#{}", anchor, date.format("%Y%m%d")), false)
        }
        (None, false) => (record.link.clone(), true),
        (None, true) => {
            let seed = format!("{}|{}", base_url, record.title);
            let id = Uuid::new_v5(&Uuid::NAMESPACE_URL, seed.as_bytes());
            (id.urn().to_string(), false)
        }
    }
}

/// RFC 2822 rendering of a calendar date at UTC midnight.
fn rfc2822_midnight(date: NaiveDate) -> String {
    let dt = DateTime::<Utc>::from_naive_utc_and_offset(date.and_time(NaiveTime::MIN), Utc);
    dt.to_rfc2822()
}

fn write_text_element<W: Write>(
    w: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), Box<dyn Error>> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Render one site's record sequence as an RSS 2.0 document.
pub fn render_feed(site: &SiteConfig, records: &[Record]) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    writer.write_event(Event::Start(rss))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    let title = site
        .feed
        .title
        .clone()
        .unwrap_or_else(|| format!("{}トピックス", site.name));
    let description = site
        .feed
        .description
        .clone()
        .unwrap_or_else(|| format!("{}の最新トピック情報", site.name));
    write_text_element(&mut writer, "title", &title)?;
    write_text_element(&mut writer, "link", &site.base_url)?;
    write_text_element(&mut writer, "description", &description)?;
    write_text_element(&mut writer, "language", &site.feed.language)?;
    write_text_element(
        &mut writer,
        "generator",
        concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION")),
    )?;
    write_text_element(&mut writer, "docs", "https://www.rssboard.org/rss-specification")?;
    write_text_element(&mut writer, "lastBuildDate", &Utc::now().to_rfc2822())?;

    for record in records {
        writer.write_event(Event::Start(BytesStart::new("item")))?;
        write_text_element(&mut writer, "title", &record.title)?;
        let link = if record.link.is_empty() {
            site.base_url.as_str()
        } else {
            record.link.as_str()
        };
        write_text_element(&mut writer, "link", link)?;
        write_text_element(&mut writer, "description", &record.description)?;

        let (guid, permalink) = entry_guid(record, &site.base_url);
        let mut guid_el = BytesStart::new("guid");
        guid_el.push_attribute(("isPermaLink", if permalink { "true" } else { "false" }));
        writer.write_event(Event::Start(guid_el))?;
        writer.write_event(Event::Text(BytesText::new(&guid)))?;
        writer.write_event(Event::End(BytesEnd::new("guid")))?;

        if let Some(date) = record.pub_date {
            write_text_element(&mut writer, "pubDate", &rfc2822_midnight(date))?;
        }
        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;
    Ok(writer.into_inner())
}

/// Render and write one site's feed to `{output_dir}/{site.name}.xml`.
pub async fn write_feed(
    site: &SiteConfig,
    records: &[Record],
    output_dir: &str,
) -> Result<String, Box<dyn Error>> {
    let xml = render_feed(site, records)?;
    tokio::fs::create_dir_all(output_dir).await?;
    let path = format!("{}/{}.xml", output_dir.trim_end_matches('/'), site.name);
    tokio::fs::write(&path, xml).await?;
    info!(path = %path, count = records.len(), "Wrote feed");
    Ok(path)
}
