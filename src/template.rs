//! Template field model: label detection and document assembly.
//! - Scans lines for `Label:` fields (bulleted, numbered, or bold-wrapped)
//! - Derives a normalized key per field via the slugger
//! - Reassembles the document rewriting only the label lines

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::reconcile::NO_DATA;
use crate::slug::slugify;

/// One detected label line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// 0-based line index, stable within one parse of the template.
    pub position: usize,
    /// Label text as written, stripped of bullets and emphasis markers.
    pub raw_label: String,
    /// Normalized key derived from `raw_label`. Not injective: distinct
    /// labels may collapse to the same key; duplicates are told apart by
    /// `position` only.
    pub key: String,
}

// Label-line grammar, kept as named pieces so each rule stays auditable on
// its own. A colon inside the bold markers never matches (the body excludes
// colons); that is a template-authoring constraint.
const PREFIX: &str = r"(?:[-*+]\s+|\d+\.\s+)?"; // list bullet or ordinal
const EMPHASIS: &str = r"(?:\*\*)?"; // optional ** wrap
const BODY: &str = r"(?P<label>[^:*]+?)"; // no colon, no emphasis marker

lazy_static! {
    static ref LABEL_RE: Regex =
        Regex::new(&format!(r"^\s*{PREFIX}{EMPHASIS}{BODY}{EMPHASIS}\s*:\s*$"))
            .expect("valid label grammar");
}

/// Scan template lines for label fields, in line order.
///
/// A matched line whose body trims to nothing (a bare colon) or whose body
/// slugs to nothing (pure punctuation) yields no field. An empty result is
/// not an error here; the service layer decides what a zero-field template
/// means.
pub fn extract_fields(lines: &[&str]) -> Vec<Field> {
    let mut fields = Vec::new();
    for (position, line) in lines.iter().enumerate() {
        let Some(caps) = LABEL_RE.captures(line) else {
            continue;
        };
        let raw_label = caps["label"].trim().to_string();
        if raw_label.is_empty() {
            continue;
        }
        let key = slugify(&raw_label);
        if key.is_empty() {
            continue;
        }
        fields.push(Field {
            position,
            raw_label,
            key,
        });
    }
    fields
}

/// Rewrite every field line with its value; all other lines pass through
/// byte-identical.
///
/// The value lands after the last colon on the line, so decorative colons
/// earlier on the line are tolerated. A field whose key is absent from
/// `data` is written as the no-data sentinel. Output is newline-joined and
/// ends with exactly one trailing newline.
pub fn assemble_document(
    lines: &[&str],
    fields: &[Field],
    data: &BTreeMap<String, String>,
) -> String {
    let mut out: Vec<String> = lines.iter().map(|line| (*line).to_string()).collect();
    for field in fields {
        if field.position >= out.len() {
            continue;
        }
        let line = &out[field.position];
        let value = data.get(&field.key).map_or(NO_DATA, String::as_str);
        let rewritten = match line.rfind(':') {
            Some(idx) => format!("{} {}", &line[..=idx], value),
            // Indexed lines always carry a colon; if one ever does not,
            // append instead of dropping the value.
            None => format!("{} {}", line.trim_end(), value),
        };
        out[field.position] = rewritten;
    }
    out.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "\
# Brief Audiovisual

- **Cliente/Marca**:
Sitio web:
3. Fecha de entrega:

Las líneas sin etiqueta no se tocan.";

    fn template_lines() -> Vec<&'static str> {
        TEMPLATE.lines().collect()
    }

    fn value_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn detects_bulleted_bold_plain_and_ordinal_labels() {
        let lines = template_lines();
        let fields = extract_fields(&lines);

        let summary: Vec<(usize, &str, &str)> = fields
            .iter()
            .map(|f| (f.position, f.raw_label.as_str(), f.key.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (2, "Cliente/Marca", "cliente_marca"),
                (3, "Sitio web", "sitio_web"),
                (4, "Fecha de entrega", "fecha_de_entrega"),
            ]
        );
    }

    #[test]
    fn trailing_content_after_colon_is_not_a_label() {
        let fields = extract_fields(&["Sitio web: https://acme.example"]);
        assert!(fields.is_empty());
    }

    #[test]
    fn lone_colon_is_not_a_label() {
        assert!(extract_fields(&[":"]).is_empty());
        assert!(extract_fields(&["   :"]).is_empty());
    }

    #[test]
    fn colon_inside_bold_markers_is_not_a_label() {
        // The body excludes colons, so `**Label:**` is rejected; the
        // supported authoring form is `**Label**:`.
        assert!(extract_fields(&["- **Cliente/Marca:**"]).is_empty());
    }

    #[test]
    fn duplicate_labels_share_a_key_but_not_a_position() {
        let fields = extract_fields(&["Contacto:", "algo", "Contacto:"]);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].key, "contacto");
        assert_eq!(fields[1].key, "contacto");
        assert_eq!((fields[0].position, fields[1].position), (0, 2));
    }

    #[test]
    fn assemble_rewrites_only_label_lines() {
        let lines = template_lines();
        let fields = extract_fields(&lines);
        let data = value_map(&[
            ("cliente_marca", "Acme"),
            ("sitio_web", "https://acme.example"),
            ("fecha_de_entrega", "2024-03-01"),
        ]);

        let document = assemble_document(&lines, &fields, &data);
        let out: Vec<&str> = document.lines().collect();

        assert_eq!(out[2], "- **Cliente/Marca**: Acme");
        assert_eq!(out[3], "Sitio web: https://acme.example");
        assert_eq!(out[4], "3. Fecha de entrega: 2024-03-01");
        // Every non-field line survives byte-identical, at its position.
        for (i, line) in lines.iter().enumerate() {
            if ![2, 3, 4].contains(&i) {
                assert_eq!(out[i], *line);
            }
        }
        assert!(document.ends_with('\n'));
        assert!(!document.ends_with("\n\n"));
    }

    #[test]
    fn assemble_fills_sentinel_when_no_value_exists() {
        let lines = vec!["Sitio web:"];
        let fields = extract_fields(&lines);
        let document = assemble_document(&lines, &fields, &BTreeMap::new());
        assert_eq!(document, "Sitio web: Sin datos\n");
    }

    #[test]
    fn assemble_writes_one_value_onto_every_duplicate_position() {
        let lines = vec!["Contacto:", "texto", "Contacto:"];
        let fields = extract_fields(&lines);
        let data = value_map(&[("contacto", "Ana")]);
        let document = assemble_document(&lines, &fields, &data);
        assert_eq!(document, "Contacto: Ana\ntexto\nContacto: Ana\n");
    }

    #[test]
    fn assemble_appends_when_an_indexed_line_has_no_colon() {
        // Cannot happen through extract_fields; exercised directly.
        let field = Field {
            position: 0,
            raw_label: "Nota".to_string(),
            key: "nota".to_string(),
        };
        let data = value_map(&[("nota", "ok")]);
        let document = assemble_document(&["Nota sin dos puntos  "], &[field], &data);
        assert_eq!(document, "Nota sin dos puntos ok\n");
    }

    #[test]
    fn assembly_is_deterministic() {
        let lines = template_lines();
        let fields = extract_fields(&lines);
        let data = value_map(&[("cliente_marca", "Acme")]);
        assert_eq!(
            assemble_document(&lines, &fields, &data),
            assemble_document(&lines, &fields, &data)
        );
    }
}
