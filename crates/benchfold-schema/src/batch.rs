//! Interpreting every document of one build into one result tree.

use crate::interpret::{InterpretError, InterpretOptions, Interpreter};
use crate::json::JsonNode;
use crate::schema::Schema;
use crate::xml::XmlNode;
use benchfold_kernel::{BuildNumber, NamePath, NodeBuilder, ResultTree, TreeBuilder, TreeError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// One content document: its path relative to the build and its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub path: String,
    pub text: String,
}

impl SourceDocument {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        self.path.rsplit(['/', '\\']).next().unwrap_or(&self.path)
    }

    /// File name without its extension.
    pub fn stem(&self) -> &str {
        let name = self.file_name();
        match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => name,
        }
    }
}

/// A build's tree plus the documents that were skipped.
#[derive(Debug, Clone)]
pub struct Interpretation {
    pub tree: ResultTree,
    pub errors: Vec<InterpretError>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BatchError {
    #[error("build has no content documents")]
    NoResults,

    #[error("none of the build's {} documents could be interpreted", .errors.len())]
    NoValidDocument { errors: Vec<InterpretError> },

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Interpret one document into its file group.
pub fn interpret_document(
    schema: &Schema,
    document: &SourceDocument,
    options: InterpretOptions,
) -> Result<NodeBuilder, InterpretError> {
    let interpreter = Interpreter::new(schema, options);
    let mut file = NodeBuilder::file_group(document.file_name(), document.path.as_str());
    let file_path = NamePath::root().child(document.path.as_str());

    let json = match serde_json::from_str::<serde_json::Value>(&document.text) {
        Ok(value) => {
            interpreter.interpret(JsonNode::new(&value), document.stem(), &mut file, &file_path)?;
            return Ok(file);
        }
        Err(e) => e.to_string(),
    };
    match roxmltree::Document::parse(&document.text) {
        Ok(xml) => {
            let root = XmlNode::root(&xml);
            interpreter.interpret(root, root.name(), &mut file, &file_path)?;
            Ok(file)
        }
        Err(e) => Err(InterpretError::Content {
            document: document.path.clone(),
            json,
            xml: e.to_string(),
        }),
    }
}

/// Interpret one document as build `build`.
pub fn interpret(
    schema: &Schema,
    document: &SourceDocument,
    build: BuildNumber,
    options: InterpretOptions,
) -> Result<ResultTree, BatchError> {
    let Interpretation { tree, .. } =
        interpret_build(schema, std::slice::from_ref(document), build, options)?;
    Ok(tree)
}

/// Interpret all documents of a build.
///
/// A document that fails is skipped and reported in
/// [`Interpretation::errors`]; the build only fails when no document could
/// be interpreted at all.
pub fn interpret_build(
    schema: &Schema,
    documents: &[SourceDocument],
    build: BuildNumber,
    options: InterpretOptions,
) -> Result<Interpretation, BatchError> {
    if documents.is_empty() {
        return Err(BatchError::NoResults);
    }
    let mut builder = TreeBuilder::new();
    let mut errors = Vec::new();
    let mut interpreted = 0usize;
    for document in documents {
        let inserted = interpret_document(schema, document, options).and_then(|file| {
            builder
                .insert(file)
                .map_err(|source| InterpretError::Tree {
                    document: document.path.clone(),
                    source,
                })
        });
        match inserted {
            Ok(_) => interpreted += 1,
            Err(err) => {
                warn!(document = %document.path, error = %err, "skipping document");
                errors.push(err);
            }
        }
    }
    if interpreted == 0 {
        return Err(BatchError::NoValidDocument { errors });
    }

    let mut tree = builder.finish();
    tree.assign_build(build)?;
    info!(
        build,
        documents = interpreted,
        skipped = errors.len(),
        values = tree.values().count(),
        "interpreted build"
    );
    Ok(Interpretation { tree, errors })
}
