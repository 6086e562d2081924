//! Positional template interpolation.
//!
//! Templates use `{0}`, `{1}`, ... placeholders; `{{` and `}}` produce literal
//! braces. Any other brace is malformed.
//!
//! ## Invariants
//!
//! - The distinct placeholder indices must be exactly `0..args.len()`. An index
//!   may appear more than once, but no argument may go unused and no placeholder
//!   may point past the argument list.

use crate::Error;

enum Piece<'t> {
    Text(&'t str),
    Arg(usize),
}

/// Substitute `args` into `template`.
pub(crate) fn interpolate(template: &str, args: &[String]) -> Result<String, Error> {
    let pieces = parse(template)?;

    let mut used = vec![false; args.len()];
    let mut placeholders = 0usize;
    let mut out_of_range = false;
    for piece in &pieces {
        if let Piece::Arg(idx) = piece {
            match used.get_mut(*idx) {
                Some(slot) if !*slot => {
                    *slot = true;
                    placeholders += 1;
                }
                Some(_) => {}
                None => out_of_range = true,
            }
        }
    }

    if out_of_range || placeholders != args.len() {
        let distinct = distinct_indices(&pieces);
        return Err(Error::FormatMismatch { template: template.to_string(), placeholders: distinct, args: args.len() });
    }

    let mut out = String::with_capacity(template.len() + args.iter().map(String::len).sum::<usize>());
    for piece in pieces {
        match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Arg(idx) => out.push_str(&args[idx]),
        }
    }
    Ok(out)
}

fn parse(template: &str) -> Result<Vec<Piece<'_>>, Error> {
    let re = regex!(r"\{\{|\}\}|\{(\d+)\}|[{}]");

    let mut pieces = Vec::new();
    let mut last = 0;
    for caps in re.captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            pieces.push(Piece::Text(&template[last..whole.start()]));
        }
        last = whole.end();

        match whole.as_str() {
            "{{" => pieces.push(Piece::Text("{")),
            "}}" => pieces.push(Piece::Text("}")),
            _ => {
                let idx = caps.get(1).and_then(|m| m.as_str().parse::<usize>().ok());
                match idx {
                    Some(idx) => pieces.push(Piece::Arg(idx)),
                    None => {
                        return Err(Error::MalformedTemplate { template: template.to_string(), offset: whole.start() });
                    }
                }
            }
        }
    }
    if last < template.len() {
        pieces.push(Piece::Text(&template[last..]));
    }
    Ok(pieces)
}

fn distinct_indices(pieces: &[Piece<'_>]) -> usize {
    let mut seen: Vec<usize> = pieces
        .iter()
        .filter_map(|p| match p {
            Piece::Arg(idx) => Some(*idx),
            Piece::Text(_) => None,
        })
        .collect();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}
