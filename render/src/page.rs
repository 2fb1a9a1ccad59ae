//! Composition of one manual page from its declarations.

use std::ops::Range;

use c2man_core::{
    DeclSpec, Declarator, EnumStore, ManualPage, Options, Parameter, PrototypeFormat,
    list_has_parameters,
};
use tracing::debug;

use crate::comment::{Section, split_function_comment, split_returns_comment};
use crate::output::{Header, Output};

/// Enumerations with more values than this are summarised, not listed.
const MAX_LISTED_ENUMERATORS: usize = 20;

/// Inputs shared by every page of a run.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub options: &'a Options,
    pub enums: &'a EnumStore,
    /// Number of input files the pages came from.
    pub input_files: usize,
    /// Terse description of grouped output.
    pub group_terse: Option<&'a str>,
}

/// Page text computed from a declaration's comment at render time.
#[derive(Debug)]
struct PageText {
    description: Option<String>,
    returns: Option<String>,
    sections: Vec<(Section, bool)>,
}

impl PageText {
    fn needs_returns(&self, page: &ManualPage) -> bool {
        self.returns.as_deref().is_some_and(|r| !r.is_empty())
            || (page.is_auto_documented() && page.is_function())
    }
}

/// How an identifier's own comment is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prose {
    Paragraph,
    Returns,
}

fn emit(out: &mut dyn Output, prose: Prose, text: Option<&str>) {
    match prose {
        Prose::Paragraph => out.paragraph(text),
        Prose::Returns => out.returns(text.unwrap_or("")),
    }
}

/// Writes `fmt`, breaking the output line after every newline.
fn output_format_string(out: &mut dyn Output, fmt: &str) {
    for c in fmt.chars() {
        out.character(c);
        if c == '\n' {
            out.break_line();
        }
    }
}

/// Writes a declarator name; unless `keep_underscores`, leading
/// underscores of the name are dropped.
fn output_decl_text(out: &mut dyn Output, text: &str, keep_underscores: bool) {
    if keep_underscores {
        out.text(text);
        return;
    }
    let name_start = text
        .find(|c: char| c == '_' || c.is_ascii_alphanumeric())
        .unwrap_or(text.len());
    for c in text[..name_start].chars() {
        out.character(c);
    }
    let mut name = &text[name_start..];
    while name.len() > 1 && name.starts_with('_') {
        name = &name[1..];
    }
    out.text(name);
}

fn output_func_declarator(
    out: &mut dyn Output,
    proto: &PrototypeFormat,
    declarator: &Declarator,
    format: bool,
) {
    let template = declarator.text.as_deref().unwrap_or("%s()");
    let Some((before, after)) = template.split_once("%s") else {
        return;
    };
    out.text(before);

    if let Some(inner) = declarator.inner.as_deref() {
        if inner.is_function() {
            output_func_declarator(out, proto, inner, format);
        } else {
            let inner_text = inner.text.as_deref().unwrap_or("");
            let split = declarator
                .name
                .as_deref()
                .filter(|name| !name.is_empty())
                .and_then(|name| inner_text.find(name).map(|at| (name, at)));
            match split {
                Some((name, at)) => {
                    out.text(&inner_text[..at]);
                    if format && proto.declarator_prefix != " " {
                        output_format_string(out, &proto.declarator_prefix);
                    }
                    output_decl_text(out, name, format);
                    out.text(&inner_text[at + name.len()..]);
                    if format {
                        output_format_string(out, &proto.declarator_suffix);
                    }
                }
                None => out.text(inner_text),
            }
        }
    }

    let Some((between, rest)) = after.split_once("()") else {
        return;
    };
    out.text(between);
    out.character('(');
    output_parameters(out, proto, &declarator.parameters, format);
    out.character(')');
    out.text(rest);
}

/// Writes a declarator, spreading a prototype over several lines when
/// `format` is set.
pub fn output_declarator(
    out: &mut dyn Output,
    proto: &PrototypeFormat,
    declarator: &Declarator,
    format: bool,
) {
    if declarator.inner.is_some() {
        output_func_declarator(out, proto, declarator, format);
    } else if let Some(text) = declarator.text.as_deref() {
        output_decl_text(out, text, format);
    }
}

/// Writes one parameter on a single line; untyped K&R parameters are
/// shown as `int`.
pub fn output_parameter(out: &mut dyn Output, proto: &PrototypeFormat, param: &Parameter) {
    match param.decl_spec.text.as_deref() {
        Some(spec) => out.text(spec),
        None if param.declarator.text.is_some() && !param.declarator.is_ellipsis() => {
            out.text("int ");
        }
        None => {}
    }
    if param.declarator.text.is_some() || param.declarator.inner.is_some() {
        if param.decl_spec.text.is_some() {
            out.character(' ');
        }
        output_declarator(out, proto, &param.declarator, false);
    }
}

fn output_parameters(
    out: &mut dyn Output,
    proto: &PrototypeFormat,
    parameters: &[Parameter],
    format: bool,
) {
    if !list_has_parameters(parameters) {
        out.text("void");
        return;
    }
    if format {
        output_format_string(out, &proto.first_param_prefix);
    }
    for (i, param) in parameters.iter().enumerate() {
        if i > 0 {
            out.character(',');
            if format {
                output_format_string(out, &proto.middle_param_prefix);
            }
        }
        output_parameter(out, proto, param);
    }
    if format {
        output_format_string(out, &proto.last_param_suffix);
    }
}

/// Writes "a `type`" or "an `type`".
fn output_conjunction(out: &mut dyn Output, type_text: &str) {
    out.character('a');
    if type_text.starts_with(['a', 'A', 'e', 'E', 'i', 'I', 'o', 'O', 'u', 'U']) {
        out.character('n');
    }
    out.character(' ');
    out.code(type_text);
}

/// Describes an identifier; enum-typed identifiers also list their
/// possible values.
fn output_identifier_description(
    out: &mut dyn Output,
    enums: &EnumStore,
    comment: Option<&str>,
    prose: Prose,
    decl_spec: &DeclSpec,
) {
    let Some(list) = decl_spec.enum_list else {
        emit(out, prose, comment);
        return;
    };

    if comment.is_some() {
        emit(out, prose, comment);
        out.blank_line();
    }

    let visible: Vec<_> = enums
        .get(list)
        .iter()
        .filter(|e| !e.name.starts_with('_'))
        .collect();
    let longest = visible
        .iter()
        .map(|e| e.name.as_str())
        .fold("", |a, b| if b.len() > a.len() { b } else { a });
    let described = visible.iter().any(|e| e.comment.is_some());
    let type_text = decl_spec.text.as_deref().unwrap_or("");

    if visible.len() > MAX_LISTED_ENUMERATORS {
        out.text("Since there are ");
        out.text(&visible.len().to_string());
        out.text(" possible values for ");
        output_conjunction(out, type_text);
        out.text(", they are not all listed here.\n");
        return;
    }
    if visible.is_empty() {
        return;
    }

    out.text("Possible values for ");
    output_conjunction(out, type_text);
    out.text(" are as follows:\n");

    let mut started = false;
    let mut first = true;
    for e in visible {
        if let Some(group) = e.group_comment.as_deref() {
            if started {
                if described {
                    out.table_end();
                } else {
                    out.list_end();
                }
                started = false;
            }
            out.indent();
            out.paragraph(Some(group));
        }
        if !started {
            if described {
                out.table_start(longest);
            } else {
                out.list_start();
            }
            started = true;
            first = true;
        }
        if described {
            out.table_entry(&e.name, e.comment.as_deref());
        } else {
            if !first {
                out.list_separator();
            }
            first = false;
            out.list_entry(&e.name);
        }
    }
    if started {
        if described {
            out.table_end();
        } else {
            out.list_end();
        }
    }
}

/// Whether any parameter of `declarator` will be listed.
pub fn has_documented_parameters(declarator: &Declarator, always_document: bool) -> bool {
    declarator.has_parameters()
        && declarator
            .head()
            .parameters
            .iter()
            .any(|p| always_document || p.comment().is_some())
}

fn output_parameter_descriptions(
    out: &mut dyn Output,
    ctx: &RenderContext<'_>,
    parameters: &[Parameter],
    function: &str,
) {
    let always = ctx.options.always_document_params;
    let mut started = false;
    for param in parameters {
        if param.suppress || (!always && param.comment().is_none()) {
            continue;
        }
        if !started {
            out.tag_list_start();
            started = true;
        }
        if param.duplicate {
            out.tag_entry_start_extra();
        } else {
            out.tag_entry_start();
        }
        output_parameter(out, &ctx.options.prototype, param);
        if param.duplicate {
            out.tag_entry_end_extra(function);
        } else {
            out.tag_entry_end();
        }
        output_identifier_description(
            out,
            ctx.enums,
            param.comment(),
            Prose::Paragraph,
            &param.decl_spec,
        );
    }
    if started {
        out.tag_list_end();
    }
}

/// Marks identical parameters across the pages of a group so each is
/// described once.
///
/// For every pair of identically declared parameters on different pages:
/// if only the later one has a comment the earlier is suppressed; if
/// neither does, or only the earlier one, or both say the same thing, the
/// later is suppressed; if their comments differ both are kept and marked
/// as duplicates. Returns whether any parameter has something to show.
pub fn mark_duplicates(pages: &mut [ManualPage], always_document: bool) -> bool {
    let mut any = false;
    for i in 0..pages.len() {
        let (head, tail) = pages.split_at_mut(i + 1);
        let page = &mut head[i];
        if !page.declarator.has_parameters() {
            continue;
        }
        for param in page.declarator.head_parameters_mut().iter_mut() {
            if always_document || param.comment().is_some() {
                any = true;
            }
            for other_page in tail.iter_mut() {
                if !other_page.declarator.has_parameters() {
                    continue;
                }
                for other in other_page.declarator.head_parameters_mut().iter_mut() {
                    if !param.is_identical(other) {
                        continue;
                    }
                    let (ours, theirs) = (param.comment(), other.comment());
                    let only_theirs = ours.is_none() && theirs.is_some();
                    let conflicting = ours.is_some() && theirs.is_some() && ours != theirs;
                    if only_theirs {
                        param.suppress = true;
                    } else if conflicting {
                        param.duplicate = true;
                        other.duplicate = true;
                    } else {
                        other.suppress = true;
                    }
                }
            }
        }
    }
    any
}

fn is_header(file: &str) -> bool {
    file.rsplit_once('.')
        .is_some_and(|(_, ext)| ext.starts_with(['h', 'H']))
}

fn file_name(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

fn starts_with_none(text: &str) -> bool {
    text.get(..4).is_some_and(|head| head.eq_ignore_ascii_case("none"))
}

fn output_synopsis(out: &mut dyn Output, options: &Options, page: &ManualPage) {
    let proto = &options.prototype;
    output_format_string(out, &proto.decl_spec_prefix);
    let spec = page.decl_spec.text.as_deref().unwrap_or("");
    if !page.decl_spec.is_static() && !page.is_function() && !spec.contains("extern") {
        out.text("extern ");
    }
    out.text(spec);
    output_format_string(out, &proto.declarator_prefix);

    let format = page.declarator.head().parameters.len() > 1;
    output_declarator(out, proto, &page.declarator, format);
    out.text(";\n");
}

/// Writes the manual page for `pages[base]`, or for all of `pages[base..]`
/// when grouping.
///
/// `title` names a grouped page; `section` goes into its header.
pub fn output_manpage(
    out: &mut dyn Output,
    ctx: &RenderContext<'_>,
    pages: &mut [ManualPage],
    base: usize,
    title: Option<&str>,
    section: &str,
) {
    let options = ctx.options;
    let group = options.group_together;
    let grouped = group && pages.len() > 1;
    let members: Range<usize> = if group {
        base..pages.len()
    } else {
        base..base + 1
    };

    let mut terse = None;
    let mut texts = Vec::with_capacity(members.len());
    for page in &pages[members.clone()] {
        let split = split_function_comment(page.comment().unwrap_or(""), page.name(), !group);
        if !group {
            terse = split.terse;
        }
        let mut description = split.description;
        let mut returns = split.returns;
        if returns.is_none() {
            if let Some(comment) = &page.declarator.return_comment {
                returns = Some(comment.clone());
            } else if !split.explicit_description
                && let Some((rest, found)) = description.as_deref().and_then(split_returns_comment)
            {
                description = rest;
                returns = found;
            }
        }
        texts.push(PageText {
            description,
            returns,
            sections: split.sections.into_iter().map(|s| (s, false)).collect(),
        });
    }

    let terse_out = ctx
        .group_terse
        .or(terse.as_deref())
        .unwrap_or("Not Described")
        .to_string();
    let name = title.unwrap_or(pages[base].name()).to_string();
    debug!(page = %name, grouped, "rendering manual page");

    out.header(&Header {
        first_page: &pages[base],
        input_files: ctx.input_files,
        grouped,
        name: &name,
        terse: &terse_out,
        section,
    });

    out.name(None);
    for i in members.clone() {
        out.name(Some(pages[i].name()));
        if !group {
            break;
        }
        if i + 1 < members.end {
            out.text(",\n");
        }
    }
    out.terse_sep();
    out.text(&terse_out);
    out.character('\n');

    if !options.is_excluded("SYNOPSIS") {
        out.section("SYNOPSIS");
        out.code_start();

        for include in &options.includes {
            let surrounded = include.starts_with(['"', '<']);
            out.text("#include ");
            if !surrounded {
                out.character('<');
            }
            out.text(include);
            if !surrounded {
                out.character('>');
            }
            out.text("\n");
            out.break_line();
        }

        let header_file = pages[base].sourcefile.as_deref().filter(|f| is_header(f));
        if let Some(file) = header_file {
            out.text("#include <");
            if let Some(prefix) = &options.header_prefix {
                out.text(prefix);
                out.character('/');
            }
            out.text(file_name(file));
            out.text(">\n");
        }
        if !options.includes.is_empty() || header_file.is_some() {
            out.blank_line();
        }

        for i in members.clone() {
            output_synopsis(out, options, &pages[i]);
            if !grouped {
                break;
            }
            if i + 1 < members.end {
                out.blank_line();
            }
        }
        out.code_end();
    }

    let always = options.always_document_params;
    let show_parameters = !options.is_excluded("PARAMETERS")
        && if grouped {
            mark_duplicates(&mut pages[members.clone()], always)
        } else {
            has_documented_parameters(&pages[base].declarator, always)
        };
    if show_parameters {
        out.section("PARAMETERS");
        for i in members.clone() {
            let page = &pages[i];
            if page.declarator.has_parameters() {
                output_parameter_descriptions(
                    out,
                    ctx,
                    &page.declarator.head().parameters,
                    page.name(),
                );
            }
            if !grouped {
                break;
            }
        }
    }

    let exclude_description = options.is_excluded("DESCRIPTION");
    if !exclude_description {
        out.section("DESCRIPTION");
    }
    let need_returns;
    if grouped {
        need_returns = texts
            .iter()
            .zip(&pages[members.clone()])
            .any(|(text, page)| text.needs_returns(page));
        if !exclude_description {
            for (text, page) in texts.iter().zip(&pages[members.clone()]) {
                if page.is_auto_documented() && !page.is_function() {
                    out.sub_section(page.name());
                    output_identifier_description(
                        out,
                        ctx.enums,
                        text.description.as_deref(),
                        Prose::Paragraph,
                        &page.decl_spec,
                    );
                } else if let Some(description) = text.description.as_deref() {
                    out.sub_section(page.name());
                    out.paragraph(Some(description));
                }
            }
        }
    } else {
        let page = &pages[base];
        need_returns = texts[0].needs_returns(page);
        if !exclude_description {
            let description = texts[0].description.as_deref().unwrap_or(&terse_out);
            if page.is_auto_documented() && !page.is_function() {
                output_identifier_description(
                    out,
                    ctx.enums,
                    Some(description),
                    Prose::Paragraph,
                    &page.decl_spec,
                );
            } else {
                out.paragraph(Some(description));
            }
        }
    }

    if need_returns && !options.is_excluded("RETURNS") {
        out.section("RETURNS");
        for (text, page) in texts.iter().zip(&pages[members.clone()]) {
            if text.needs_returns(page) {
                if grouped {
                    out.sub_section(page.name());
                }
                output_identifier_description(
                    out,
                    ctx.enums,
                    text.returns.as_deref(),
                    Prose::Returns,
                    &page.decl_spec,
                );
            }
            if !grouped {
                break;
            }
        }
    }

    for i in 0..texts.len() {
        for j in 0..texts[i].sections.len() {
            let (section, done) = &texts[i].sections[j];
            let Some(body) = section.text.clone() else {
                continue;
            };
            if *done || starts_with_none(&body) || options.is_excluded(&section.name) {
                continue;
            }
            let heading = section.name.clone();
            out.section(&heading);
            if grouped {
                out.sub_section(pages[base + i].name());
            }
            out.paragraph(Some(&body));
            texts[i].sections[j].1 = true;

            if grouped {
                for k in i + 1..texts.len() {
                    for (other, other_done) in texts[k].sections.iter_mut() {
                        if *other_done || other.name != heading {
                            continue;
                        }
                        out.sub_section(pages[base + k].name());
                        out.paragraph(other.text.as_deref());
                        *other_done = true;
                    }
                }
            }
        }
        if !grouped {
            break;
        }
    }

    if !group && !options.is_excluded("SEE ALSO") {
        let others: Vec<&str> = pages
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != base)
            .map(|(_, page)| page.name())
            .collect();
        if !others.is_empty() {
            out.section("SEE ALSO");
            for (n, other) in others.into_iter().enumerate() {
                if n > 0 {
                    out.text(",\n");
                }
                out.reference(other);
            }
            out.character('\n');
        }
    }

    if !options.embeddable {
        out.file_end();
    }
}

#[cfg(test)]
mod tests {
    use c2man_core::{DeclFlags, Enumerator};

    use super::*;
    use crate::output::{LatexOutput, NroffOutput, Settings};

    fn param(spec: &str, name: &str, comment: Option<&str>) -> Parameter {
        let mut declarator = Declarator::identifier(name);
        declarator.comment = comment.map(str::to_string);
        Parameter::new(DeclSpec::new(spec, DeclFlags::empty()), declarator)
    }

    fn function(name: &str, params: Vec<Parameter>, comment: &str) -> ManualPage {
        let mut declarator = Declarator::function(Declarator::identifier(name), params);
        declarator.comment = Some(comment.to_string());
        ManualPage {
            decl_spec: DeclSpec::new("int", DeclFlags::empty()),
            declarator,
            sourcefile: Some("lib/math.h".to_string()),
            sourcetime: None,
        }
    }

    fn flags(page: &ManualPage) -> Vec<(bool, bool)> {
        page.declarator
            .head()
            .parameters
            .iter()
            .map(|p| (p.suppress, p.duplicate))
            .collect()
    }

    #[test]
    fn test_mark_duplicates_matrix() {
        let mut pages = vec![
            function(
                "first",
                vec![
                    param("int", "neither", None),
                    param("int", "us", Some("ours")),
                    param("int", "them", None),
                    param("int", "same", Some("same text")),
                    param("int", "differ", Some("one")),
                ],
                "doc",
            ),
            function(
                "second",
                vec![
                    param("int", "neither", None),
                    param("int", "us", None),
                    param("int", "them", Some("theirs")),
                    param("int", "same", Some("same text")),
                    param("int", "differ", Some("two")),
                ],
                "doc",
            ),
        ];

        assert!(mark_duplicates(&mut pages, false));
        assert_eq!(
            flags(&pages[0]),
            vec![(false, false), (false, false), (true, false), (false, false), (false, true)]
        );
        assert_eq!(
            flags(&pages[1]),
            vec![(true, false), (true, false), (false, false), (true, false), (false, true)]
        );
    }

    #[test]
    fn test_mark_duplicates_ignores_different_declarations() {
        let mut pages = vec![
            function("a", vec![param("int", "x", None)], "doc"),
            function("b", vec![param("long", "x", None)], "doc"),
        ];
        assert!(!mark_duplicates(&mut pages, false));
        assert_eq!(flags(&pages[1]), vec![(false, false)]);
        assert!(mark_duplicates(&mut pages, true));
    }

    #[test]
    fn test_declarator_output_layouts() {
        let options = Options::default();
        let page = function(
            "add",
            vec![param("int", "a", None), param("int", "b", None)],
            "doc",
        );
        let mut out = LatexOutput::new(Settings::default());
        output_synopsis(&mut out, &options, &page);
        assert_eq!(out.take_output(), "int add\n(\n    int a,\n    int b\n);\n");

        let single = function("neg", vec![param("int", "__x", None)], "doc");
        output_synopsis(&mut out, &options, &single);
        assert_eq!(out.take_output(), "int neg(int x);\n");

        let none = function("now", vec![], "doc");
        output_synopsis(&mut out, &options, &none);
        assert_eq!(out.take_output(), "int now(void);\n");
    }

    #[test]
    fn test_function_pointer_parameter_output() {
        let handler = Declarator::function(
            Declarator::identifier("handler").pointer_to("*").parenthesized(),
            vec![param("int", "sig", None)],
        );
        let p = Parameter::new(DeclSpec::new("void", DeclFlags::empty()), handler);
        let mut out = LatexOutput::new(Settings::default());
        output_parameter(&mut out, &PrototypeFormat::default(), &p);
        assert_eq!(out.take_output(), "void (*handler)(int sig)");

        let mut out = LatexOutput::new(Settings::default());
        output_parameter(&mut out, &PrototypeFormat::default(), &Parameter::untyped("n"));
        assert_eq!(out.take_output(), "int n");
    }

    #[test]
    fn test_variables_are_shown_extern() {
        let options = Options::default();
        let mut declarator = Declarator::identifier("count");
        declarator.comment = Some("doc".to_string());
        let page = ManualPage {
            decl_spec: DeclSpec::new("int", DeclFlags::empty()),
            declarator,
            sourcefile: None,
            sourcetime: None,
        };
        let mut out = LatexOutput::new(Settings::default());
        output_synopsis(&mut out, &options, &page);
        assert_eq!(out.take_output(), "extern int count;\n");
    }

    #[test]
    fn test_enum_values_listed() {
        let mut enums = EnumStore::new();
        let list = enums.new_list(Enumerator::new("RED", None, Some("warm".to_string())));
        enums.append(list, Enumerator::new("_HIDDEN", None, None));
        enums.append(list, Enumerator::new("BLUE", None, None));
        let spec = DeclSpec::new("enum colour", DeclFlags::empty()).with_enum_list(list);

        let mut out = NroffOutput::new(Settings::default());
        output_identifier_description(&mut out, &enums, Some("the colour"), Prose::Paragraph, &spec);
        let text = out.take_output();
        assert!(text.starts_with("The colour.\n.sp\nPossible values for an \\fBenum colour\\fR are as follows:\n"));
        assert!(text.contains(".nr TL \\w'BLUE'u+0.2i\n"));
        assert!(text.contains("\\fBRED\\fR\nWarm.\n"));
        assert!(text.contains("\\fBBLUE\\fR\n\n.RE\n"));
        assert!(!text.contains("_HIDDEN"));
    }

    #[test]
    fn test_large_enums_summarised() {
        let mut enums = EnumStore::new();
        let list = enums.new_list(Enumerator::new("V0", None, None));
        for i in 1..25 {
            enums.append(list, Enumerator::new(format!("V{i}"), None, None));
        }
        let spec = DeclSpec::new("op", DeclFlags::empty()).with_enum_list(list);
        let mut out = LatexOutput::new(Settings::default());
        output_identifier_description(&mut out, &enums, None, Prose::Paragraph, &spec);
        assert_eq!(
            out.take_output(),
            "Since there are 25 possible values for an \\verb`op`, they are not all listed here.\n"
        );
    }

    #[test]
    fn test_sections_suppressed_when_none() {
        let options = Options::default();
        let enums = EnumStore::new();
        let ctx = RenderContext {
            options: &options,
            enums: &enums,
            input_files: 1,
            group_terse: None,
        };
        let mut pages = vec![function(
            "f",
            vec![],
            "does it.\n\nBugs:\nnone known.\n\nNotes:\nfast.",
        )];
        let mut out = LatexOutput::new(Settings::default());
        output_manpage(&mut out, &ctx, &mut pages, 0, None, "3");
        let text = out.take_output();
        assert!(!text.contains("BUGS"));
        assert!(text.contains("\\section*{NOTES}\nFast.\n"));
        assert!(!text.contains("SEE ALSO"));
        assert!(!text.contains("PARAMETERS"));
    }
}
