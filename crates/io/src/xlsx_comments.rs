//! Legacy cell comments (notes): `xl/commentsN.xml` parts and the worksheet
//! relationships that point at them.

use quick_xml::events::Event;
use quick_xml::Reader;
use sheetcheck_engine::CellAddress;

use crate::xlsx_styles::attr_value;

const COMMENTS_REL_SUFFIX: &str = "/comments";

/// Targets of every comments relationship in a worksheet `.rels` part.
pub fn comment_targets(rels_xml: &str) -> Vec<String> {
    let mut targets = Vec::new();
    let mut reader = Reader::from_str(rels_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"Relationship" =>
            {
                let is_comments = attr_value(e, b"Type")
                    .is_some_and(|t| t.ends_with(COMMENTS_REL_SUFFIX));
                if let (true, Some(target)) = (is_comments, attr_value(e, b"Target")) {
                    targets.push(target);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("malformed worksheet relationships: {e}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    targets
}

/// `(address, text)` of every comment. Rich-text runs are concatenated;
/// phonetic runs are left out.
pub fn parse_comments_xml(xml: &str) -> Vec<(CellAddress, String)> {
    let mut comments = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();

    let mut current: Option<(CellAddress, String)> = None;
    let mut in_t = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"comment" => {
                    current = match attr_value(e, b"ref").map(|r| CellAddress::parse(&r)) {
                        Some(Ok(address)) => Some((address, String::new())),
                        _ => {
                            log::warn!("skipping comment with a bad cell reference");
                            None
                        }
                    };
                }
                b"rPh" => in_phonetic = true,
                b"t" if !in_phonetic => in_t = true,
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_t => {
                if let Some((_, text)) = current.as_mut() {
                    text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(ref e)) if in_t => {
                if let Some((_, text)) = current.as_mut() {
                    match e.resolve_char_ref() {
                        Ok(Some(c)) => text.push(c),
                        _ => {
                            let name = String::from_utf8_lossy(e.as_ref()).to_string();
                            match quick_xml::escape::resolve_predefined_entity(&name) {
                                Some(resolved) => text.push_str(resolved),
                                None => {
                                    text.push('&');
                                    text.push_str(&name);
                                    text.push(';');
                                }
                            }
                        }
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"t" => in_t = false,
                b"rPh" => in_phonetic = false,
                b"comment" => {
                    if let Some(comment) = current.take() {
                        comments.push(comment);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("malformed comments part: {e}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    comments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_targets() {
        let rels = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/vmlDrawing" Target="../drawings/vmlDrawing1.vml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments" Target="../comments1.xml"/>
</Relationships>"#;
        assert_eq!(comment_targets(rels), vec!["../comments1.xml"]);
        assert!(comment_targets("<Relationships/>").is_empty());
    }

    #[test]
    fn test_parse_comments_xml() {
        let xml = r#"<comments xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <authors><author>Jane</author></authors>
  <commentList>
    <comment ref="B2" authorId="0"><text><t>plain note</t></text></comment>
    <comment ref="C3" authorId="0"><text>
      <r><rPr><b/></rPr><t>Jane:</t></r><r><t xml:space="preserve"> tags &amp; more</t></r>
      <rPh sb="0" eb="1"><t>skip</t></rPh>
    </text></comment>
  </commentList>
</comments>"#;
        let comments = parse_comments_xml(xml);
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].0.to_string(), "B2");
        assert_eq!(comments[0].1, "plain note");
        assert_eq!(comments[1].0.to_string(), "C3");
        assert_eq!(comments[1].1, "Jane: tags & more");
    }
}
