//! Class files: what a class declaration compiles to.
//!
//! A [`ClassFile`] is bincode over serde; method bodies are the checked
//! syntax tree. [`SnippetClassDefiner`] turns the bytes back into a class
//! body the loader can link.

use std::any::Any;
use std::sync::Arc;

use kiln_runtime::{ClassBody, ClassBytes, ClassDefiner, DefineError, LinkError};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::ast::{ClassDecl, MethodDecl};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassFile {
    pub name: String,
    /// Number of the snippet that declared the class; stack frames use it.
    pub snippet: u32,
    pub methods: Vec<MethodDecl>,
}

impl ClassFile {
    pub fn from_decl(decl: &ClassDecl, snippet: u32) -> Self {
        ClassFile {
            name: decl.name.clone(),
            snippet,
            methods: decl.methods.clone(),
        }
    }

    pub fn encode(&self) -> Result<ClassBytes, bincode::Error> {
        Ok(ClassBytes::new(self.name.clone(), bincode::serialize(self)?))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }

    pub fn method(&self, name: &str) -> Option<&MethodDecl> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// A defined snippet class.
#[derive(Debug)]
pub struct SnippetClass {
    file: ClassFile,
}

impl SnippetClass {
    pub fn file(&self) -> &ClassFile {
        &self.file
    }
}

impl ClassBody for SnippetClass {
    fn declared_members(&self) -> Result<Vec<String>, LinkError> {
        let mut seen = FxHashSet::default();
        let mut members = Vec::with_capacity(self.file.methods.len());
        for method in &self.file.methods {
            if !seen.insert(method.name.as_str()) {
                return Err(LinkError::new(format!(
                    "duplicate method {} in {}",
                    method.name, self.file.name
                )));
            }
            members.push(method.signature());
        }
        Ok(members)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct SnippetClassDefiner;

impl ClassDefiner for SnippetClassDefiner {
    fn define(&self, name: &str, bytes: &[u8]) -> Result<Arc<dyn ClassBody>, DefineError> {
        let file = ClassFile::decode(bytes)
            .map_err(|e| DefineError::new(format!("malformed class file for {name}: {e}")))?;
        if file.name != name {
            return Err(DefineError::new(format!(
                "{name} (wrong name: {})",
                file.name
            )));
        }
        Ok(Arc::new(SnippetClass { file }))
    }
}
