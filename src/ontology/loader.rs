//! Reads ontology documents from disk and resolves their `owl:imports`.

use std::collections::{BTreeSet, VecDeque};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use oxrdf::Term;
use oxrdfio::{RdfFormat, RdfParser};
use reqwest::Url;
use tracing::{debug, info, warn};

use super::{
    entities::{LoadedOntology, Ontology, OntologyError},
    value_objects::{ClassExpression, Iri, LiteralValue},
    vocab,
};
use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Node {
    Named(Iri),
    Blank(String),
    Literal(LiteralValue),
}

impl Node {
    fn named(&self) -> Option<&Iri> {
        match self {
            Self::Named(iri) => Some(iri),
            _ => None,
        }
    }

    fn class_expression(&self) -> Option<ClassExpression> {
        match self {
            Self::Named(iri) => Some(ClassExpression::Named(iri.clone())),
            Self::Blank(id) => Some(ClassExpression::Anonymous(id.clone())),
            Self::Literal(_) => None,
        }
    }
}

impl From<Term> for Node {
    fn from(term: Term) -> Self {
        match term {
            Term::NamedNode(node) => Self::Named(Iri::from(node)),
            Term::Literal(literal) => Self::Literal(LiteralValue::from(&literal)),
            Term::BlankNode(node) => Self::Blank(node.as_str().to_string()),
            #[allow(unreachable_patterns)]
            other => Self::Blank(other.to_string()),
        }
    }
}

#[derive(Clone, Debug)]
struct Triple {
    subject: Node,
    predicate: Iri,
    object: Node,
}

/// Picks the RDF syntax from the file extension.
///
/// `.owl` and `.xml` are treated as RDF/XML, which is how OWL tooling saves
/// ontologies by default.
#[must_use]
pub fn format_for(path: &Path) -> Option<RdfFormat> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "owl" | "rdf" | "xml" => Some(RdfFormat::RdfXml),
        other => RdfFormat::from_extension(other),
    }
}

/// Loads the ontology at `path` together with every import that can be
/// resolved locally.
///
/// Property assertions are classified once the whole import closure is
/// known, so a data ontology may use properties declared by the schema it
/// imports.
///
/// # Errors
///
/// Fails when the primary document cannot be read or parsed. Imports that
/// cannot be located are skipped with a warning; imports that are found but
/// fail to parse abort the load.
pub fn load_ontology(path: &Path) -> Result<LoadedOntology> {
    let path = path.canonicalize().map_err(|source| Error::OntologyIo {
        path: path.to_path_buf(),
        source,
    })?;
    let primary = read_document(&path)?;
    info!(
        ontology = %primary.ontology.id(),
        classes = primary.ontology.classes().len(),
        individuals = primary.ontology.individuals().len(),
        "ontology document loaded"
    );

    let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let mut pending: VecDeque<Iri> = primary.ontology.imports().iter().cloned().collect();
    let mut seen = BTreeSet::from([primary.ontology.id().clone()]);
    let mut attempted = BTreeSet::new();
    let mut imports = Vec::new();

    while let Some(import) = pending.pop_front() {
        if seen.contains(&import) || !attempted.insert(import.clone()) {
            continue;
        }
        let Some(location) = resolve_import(&import, &directory) else {
            warn!(%import, "cannot locate imported ontology, skipping");
            continue;
        };
        let document = read_document(&location)?;
        debug!(%import, path = %location.display(), "import resolved");
        if !seen.insert(document.ontology.id().clone()) {
            continue;
        }
        pending.extend(document.ontology.imports().iter().cloned());
        imports.push(document);
    }

    let signature = Signature::of(std::iter::once(&primary).chain(&imports));
    let mut loaded = LoadedOntology::new(primary.resolve(&signature)?);
    for document in imports {
        loaded.add_import(document.resolve(&signature)?);
    }
    Ok(loaded)
}

fn resolve_import(import: &Iri, directory: &Path) -> Option<PathBuf> {
    if import.as_str().starts_with("file:") {
        let candidate = Url::parse(import.as_str()).ok()?.to_file_path().ok()?;
        return candidate.is_file().then_some(candidate);
    }
    let segment = import
        .as_str()
        .trim_end_matches(['/', '#'])
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())?;
    let candidate = directory.join(segment);
    candidate.is_file().then_some(candidate)
}

/// Parses a single RDF document into an [`Ontology`] without following
/// imports. Property assertions only see the document's own declarations.
///
/// # Errors
///
/// Returns an error for unknown extensions, unreadable files and syntax errors.
pub fn parse_document(path: &Path) -> Result<Ontology> {
    let document = read_document(path)?;
    let signature = Signature::of(std::iter::once(&document));
    Ok(document.resolve(&signature)?)
}

/// `file:` IRI of `path`, percent-encoded.
fn document_iri(path: &Path) -> Result<Iri> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|source| Error::OntologyIo {
                path: path.to_path_buf(),
                source,
            })?
            .join(path)
    };
    let url = Url::from_file_path(&absolute).map_err(|()| Error::OntologyParse {
        path: path.to_path_buf(),
        reason: "path cannot be expressed as a file IRI".to_string(),
    })?;
    Ok(Iri::new(String::from(url))?)
}

fn read_triples(path: &Path, format: RdfFormat, base: &Iri) -> Result<Vec<Triple>> {
    let parse_error = |reason: String| Error::OntologyParse {
        path: path.to_path_buf(),
        reason,
    };
    let file = File::open(path).map_err(|source| Error::OntologyIo {
        path: path.to_path_buf(),
        source,
    })?;
    let parser = RdfParser::from_format(format)
        .with_base_iri(base.as_str())
        .map_err(|err| parse_error(err.to_string()))?;

    let mut triples = Vec::new();
    for quad in parser.for_reader(BufReader::new(file)) {
        let quad = quad.map_err(|err| parse_error(err.to_string()))?;
        triples.push(Triple {
            subject: Node::from(Term::from(quad.subject)),
            predicate: Iri::from(quad.predicate),
            object: Node::from(quad.object),
        });
    }
    debug!(path = %path.display(), triples = triples.len(), "document parsed");
    Ok(triples)
}

/// A parsed document whose property assertions are not classified yet.
struct Document {
    ontology: Ontology,
    annotation_properties: BTreeSet<Iri>,
    assertions: Vec<Triple>,
}

/// Declarations of a set of documents, used to tell property assertions
/// from annotations.
#[derive(Default)]
struct Signature {
    classes: BTreeSet<Iri>,
    object_properties: BTreeSet<Iri>,
    data_properties: BTreeSet<Iri>,
    annotation_properties: BTreeSet<Iri>,
}

impl Signature {
    fn of<'a>(documents: impl IntoIterator<Item = &'a Document>) -> Self {
        let mut signature = Self::default();
        for document in documents {
            let ontology = &document.ontology;
            signature.classes.extend(ontology.classes().iter().cloned());
            signature
                .object_properties
                .extend(ontology.object_properties().iter().cloned());
            signature
                .data_properties
                .extend(ontology.data_properties().iter().cloned());
            signature
                .annotation_properties
                .extend(document.annotation_properties.iter().cloned());
        }
        signature
    }

    fn is_data_property(&self, property: &Iri) -> bool {
        self.data_properties.contains(property) && !self.annotation_properties.contains(property)
    }

    fn is_object_property(&self, property: &Iri) -> bool {
        self.object_properties.contains(property)
    }

    /// Classes and properties never carry property assertions.
    fn may_assert(&self, subject: &Iri) -> bool {
        !self.classes.contains(subject)
            && !self.object_properties.contains(subject)
            && !self.data_properties.contains(subject)
    }
}

fn read_document(path: &Path) -> Result<Document> {
    let format = format_for(path).ok_or_else(|| Error::UnsupportedFormat(path.to_path_buf()))?;
    let document_iri = document_iri(path)?;
    let triples = read_triples(path, format, &document_iri)?;
    Ok(classify(document_iri, triples)?)
}

fn classify(document_iri: Iri, triples: Vec<Triple>) -> Result<Document, OntologyError> {
    let mut ontology_iri = None;
    let mut annotation_properties = BTreeSet::new();
    for triple in &triples {
        if triple.predicate.as_str() != vocab::RDF_TYPE {
            continue;
        }
        if let (Node::Named(subject), Some(kind)) = (&triple.subject, triple.object.named()) {
            match kind.as_str() {
                vocab::OWL_ONTOLOGY if ontology_iri.is_none() => {
                    ontology_iri = Some(subject.clone());
                }
                vocab::OWL_ANNOTATION_PROPERTY => {
                    annotation_properties.insert(subject.clone());
                }
                _ => {}
            }
        }
    }

    let mut ontology = Ontology::new(ontology_iri.unwrap_or(document_iri));

    // Type triples first so property kinds are known before assertions.
    let (types, axioms): (Vec<_>, Vec<_>) = triples
        .into_iter()
        .partition(|triple| triple.predicate.as_str() == vocab::RDF_TYPE);
    for triple in &types {
        let (Node::Named(subject), Some(kind)) = (&triple.subject, triple.object.named()) else {
            continue;
        };
        match kind.as_str() {
            vocab::OWL_CLASS | vocab::RDFS_CLASS => {
                ontology.declare_class(subject.clone());
            }
            vocab::OWL_OBJECT_PROPERTY => {
                ontology.declare_object_property(subject.clone())?;
            }
            vocab::OWL_DATATYPE_PROPERTY => {
                ontology.declare_data_property(subject.clone())?;
            }
            vocab::OWL_TRANSITIVE_PROPERTY => {
                ontology.declare_object_property(subject.clone())?;
                ontology.mark_transitive(subject.clone());
            }
            vocab::OWL_SYMMETRIC_PROPERTY => {
                ontology.declare_object_property(subject.clone())?;
                ontology.mark_symmetric(subject.clone());
            }
            vocab::OWL_NAMED_INDIVIDUAL => {
                ontology.declare_individual(subject.clone());
            }
            other if !vocab::is_builtin(other) => {
                ontology.assert_type(subject.clone(), kind.clone());
            }
            _ => {}
        }
    }

    let mut assertions = Vec::new();
    for triple in axioms {
        if !classify_axiom(&mut ontology, &triple)? {
            assertions.push(triple);
        }
    }

    Ok(Document {
        ontology,
        annotation_properties,
        assertions,
    })
}

/// Records schema axioms. Returns `false` for triples that can only be
/// classified against the import closure.
fn classify_axiom(ontology: &mut Ontology, triple: &Triple) -> Result<bool, OntologyError> {
    match triple.predicate.as_str() {
        vocab::OWL_IMPORTS => {
            if let Some(import) = triple.object.named() {
                ontology.add_import(import.clone());
            }
        }
        vocab::RDFS_SUB_CLASS_OF => {
            if let (Node::Named(sub), Some(sup)) =
                (&triple.subject, triple.object.class_expression())
            {
                ontology.add_sub_class(sub.clone(), sup);
            }
        }
        vocab::OWL_EQUIVALENT_CLASS => {
            if let (Some(a), Some(b)) = (
                triple.subject.class_expression(),
                triple.object.class_expression(),
            ) {
                ontology.add_equivalence(a, b);
            }
        }
        vocab::OWL_DISJOINT_WITH => {
            if let (Node::Named(a), Node::Named(b)) = (&triple.subject, &triple.object) {
                ontology.add_disjoint(a.clone(), b.clone());
            }
        }
        vocab::RDFS_SUB_PROPERTY_OF => {
            if let (Node::Named(sub), Node::Named(sup)) = (&triple.subject, &triple.object) {
                ontology.add_sub_property(sub.clone(), sup.clone());
            }
        }
        vocab::OWL_INVERSE_OF => {
            if let (Node::Named(a), Node::Named(b)) = (&triple.subject, &triple.object) {
                ontology.declare_object_property(a.clone())?;
                ontology.declare_object_property(b.clone())?;
                ontology.add_inverse(a.clone(), b.clone());
            }
        }
        _ => return Ok(false),
    }
    Ok(true)
}

impl Document {
    /// Classifies the remaining triples as property assertions or
    /// annotations against `signature`.
    fn resolve(mut self, signature: &Signature) -> Result<Ontology, OntologyError> {
        let mut dropped = 0_usize;
        for triple in std::mem::take(&mut self.assertions) {
            let Node::Named(subject) = &triple.subject else {
                continue;
            };
            let predicate = &triple.predicate;
            let individual_subject = signature.may_assert(subject);
            match &triple.object {
                Node::Literal(value) => {
                    if individual_subject && signature.is_data_property(predicate) {
                        self.ontology.assert_data_property(
                            subject.clone(),
                            predicate.clone(),
                            value.clone(),
                        )?;
                    } else {
                        self.ontology
                            .annotate(subject.clone(), predicate.clone(), value.clone());
                    }
                }
                Node::Named(object) => {
                    if individual_subject && signature.is_object_property(predicate) {
                        self.ontology.assert_object_property(
                            subject.clone(),
                            predicate.clone(),
                            object.clone(),
                        )?;
                    } else {
                        dropped += 1;
                    }
                }
                Node::Blank(_) => dropped += 1,
            }
        }
        if dropped > 0 {
            debug!(
                ontology = %self.ontology.id(),
                triples = dropped,
                "triples outside the imported vocabulary ignored"
            );
        }
        Ok(self.ontology)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use oxrdfio::RdfFormat;
    use rstest::rstest;

    use super::format_for;

    #[rstest]
    #[case("go.owl", Some(RdfFormat::RdfXml))]
    #[case("go.OWL", Some(RdfFormat::RdfXml))]
    #[case("pizza.ttl", Some(RdfFormat::Turtle))]
    #[case("dump.nt", Some(RdfFormat::NTriples))]
    #[case("README", None)]
    #[case("notes.txt", None)]
    fn detects_format_from_extension(#[case] file: &str, #[case] expected: Option<RdfFormat>) {
        assert_eq!(format_for(Path::new(file)), expected);
    }
}
