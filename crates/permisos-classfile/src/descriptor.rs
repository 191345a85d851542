//! Descriptors and generic signatures (JVMS 4.3, 4.7.9.1)
//!
//! Plain descriptors are a subset of the signature grammar, so a single
//! parser handles both.

use std::fmt;
use thiserror::Error;

/// Malformed descriptor or signature
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed signature {signature:?} at position {position}")]
pub struct SignatureError {
    /// The input text
    pub signature: String,
    /// Byte position of the failure
    pub position: usize,
}

/// A (possibly generic) Java type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JavaType {
    /// Primitive or `void`, by descriptor character
    Base(char),
    /// Class type by internal name, with the type arguments of its last segment
    Class {
        /// Internal name (`java/util/Map$Entry`)
        internal_name: String,
        /// Type arguments
        arguments: Vec<TypeArgument>,
    },
    /// Array of the component type
    Array(Box<JavaType>),
    /// Type variable reference
    Variable(String),
}

/// A type argument in a parameterized type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeArgument {
    /// `?`
    Wildcard,
    /// `? extends T`
    Extends(JavaType),
    /// `? super T`
    Super(JavaType),
    /// `T`
    Exact(JavaType),
}

/// A formal type parameter with its bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParameter {
    /// Parameter name
    pub name: String,
    /// Class bound followed by interface bounds
    pub bounds: Vec<JavaType>,
}

/// Parsed class `Signature` attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSignature {
    /// Formal type parameters
    pub type_parameters: Vec<TypeParameter>,
    /// Generic superclass
    pub superclass: JavaType,
    /// Generic superinterfaces
    pub interfaces: Vec<JavaType>,
}

/// Parsed method descriptor or method `Signature` attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    /// Formal type parameters (always empty for plain descriptors)
    pub type_parameters: Vec<TypeParameter>,
    /// Parameter types
    pub parameters: Vec<JavaType>,
    /// Return type
    pub return_type: JavaType,
}

impl JavaType {
    /// Whether this is `java.lang.Object`
    pub fn is_object(&self) -> bool {
        matches!(self, JavaType::Class { internal_name, arguments }
            if internal_name == "java/lang/Object" && arguments.is_empty())
    }

    /// Whether this is a primitive type (not `void`, not a reference)
    pub fn is_primitive(&self) -> bool {
        matches!(self, JavaType::Base(c) if *c != 'V')
    }
}

fn base_name(c: char) -> &'static str {
    match c {
        'B' => "byte",
        'C' => "char",
        'D' => "double",
        'F' => "float",
        'I' => "int",
        'J' => "long",
        'S' => "short",
        'Z' => "boolean",
        _ => "void",
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaType::Base(c) => f.write_str(base_name(*c)),
            JavaType::Class {
                internal_name,
                arguments,
            } => {
                f.write_str(&internal_to_qualified(internal_name))?;
                if !arguments.is_empty() {
                    f.write_str("<")?;
                    for (i, argument) in arguments.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", argument)?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            JavaType::Array(component) => write!(f, "{}[]", component),
            JavaType::Variable(name) => f.write_str(name),
        }
    }
}

impl fmt::Display for TypeArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeArgument::Wildcard => f.write_str("?"),
            TypeArgument::Extends(t) => write!(f, "? extends {}", t),
            TypeArgument::Super(t) => write!(f, "? super {}", t),
            TypeArgument::Exact(t) => write!(f, "{}", t),
        }
    }
}

/// `a/b/Outer$Inner` -> `a.b.Outer$Inner`
pub fn internal_to_binary(internal_name: &str) -> String {
    internal_name.replace('/', ".")
}

/// `a/b/Outer$Inner` -> `a.b.Outer.Inner`
pub fn internal_to_qualified(internal_name: &str) -> String {
    internal_name.replace(['/', '$'], ".")
}

/// `a.b.Outer$Inner` -> `a/b/Outer$Inner`
pub fn binary_to_internal(binary_name: &str) -> String {
    binary_name.replace('.', "/")
}

/// Field descriptor for a class given by internal name (`Lname;`)
pub fn class_descriptor(internal_name: &str) -> String {
    format!("L{};", internal_name)
}

struct SignatureParser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SignatureParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn error(&self) -> SignatureError {
        SignatureError {
            signature: self.text.to_string(),
            position: self.pos,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Result<(), SignatureError> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn identifier(&mut self, stops: &[u8]) -> Result<&'a str, SignatureError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if stops.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error());
        }
        Ok(&self.text[start..self.pos])
    }

    fn finish(&self) -> Result<(), SignatureError> {
        if self.pos == self.bytes.len() {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn type_parameters(&mut self) -> Result<Vec<TypeParameter>, SignatureError> {
        let mut parameters = Vec::new();
        if self.peek() != Some(b'<') {
            return Ok(parameters);
        }
        self.pos += 1;
        while self.peek() != Some(b'>') {
            let name = self.identifier(b":>")?.to_string();
            let mut bounds = Vec::new();
            // Class bound (may be empty), then any number of interface bounds
            self.expect(b':')?;
            if !matches!(self.peek(), Some(b':') | Some(b'>')) {
                bounds.push(self.reference_type()?);
            }
            while self.peek() == Some(b':') {
                self.pos += 1;
                bounds.push(self.reference_type()?);
            }
            parameters.push(TypeParameter { name, bounds });
        }
        self.pos += 1;
        Ok(parameters)
    }

    fn java_type(&mut self) -> Result<JavaType, SignatureError> {
        match self.peek() {
            Some(c @ (b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b'V')) => {
                self.pos += 1;
                Ok(JavaType::Base(c as char))
            }
            _ => self.reference_type(),
        }
    }

    fn reference_type(&mut self) -> Result<JavaType, SignatureError> {
        match self.peek() {
            Some(b'L') => self.class_type(),
            Some(b'T') => {
                self.pos += 1;
                let name = self.identifier(b";")?.to_string();
                self.expect(b';')?;
                Ok(JavaType::Variable(name))
            }
            Some(b'[') => {
                self.pos += 1;
                Ok(JavaType::Array(Box::new(self.java_type()?)))
            }
            _ => Err(self.error()),
        }
    }

    fn class_type(&mut self) -> Result<JavaType, SignatureError> {
        self.expect(b'L')?;
        let mut internal_name = self.identifier(b"<.;")?.to_string();
        let mut arguments = self.type_arguments()?;
        while self.peek() == Some(b'.') {
            self.pos += 1;
            internal_name.push('$');
            internal_name.push_str(self.identifier(b"<.;")?);
            arguments = self.type_arguments()?;
        }
        self.expect(b';')?;
        Ok(JavaType::Class {
            internal_name,
            arguments,
        })
    }

    fn type_arguments(&mut self) -> Result<Vec<TypeArgument>, SignatureError> {
        let mut arguments = Vec::new();
        if self.peek() != Some(b'<') {
            return Ok(arguments);
        }
        self.pos += 1;
        while self.peek() != Some(b'>') {
            let argument = match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    TypeArgument::Wildcard
                }
                Some(b'+') => {
                    self.pos += 1;
                    TypeArgument::Extends(self.reference_type()?)
                }
                Some(b'-') => {
                    self.pos += 1;
                    TypeArgument::Super(self.reference_type()?)
                }
                None => return Err(self.error()),
                _ => TypeArgument::Exact(self.reference_type()?),
            };
            arguments.push(argument);
        }
        self.pos += 1;
        Ok(arguments)
    }
}

/// Parse a method descriptor or a method `Signature` attribute
pub fn parse_method_signature(text: &str) -> Result<MethodSignature, SignatureError> {
    let mut parser = SignatureParser::new(text);
    let type_parameters = parser.type_parameters()?;
    parser.expect(b'(')?;
    let mut parameters = Vec::new();
    while parser.peek() != Some(b')') {
        if parser.peek().is_none() {
            return Err(parser.error());
        }
        parameters.push(parser.java_type()?);
    }
    parser.pos += 1;
    let return_type = parser.java_type()?;
    // Throws clauses carry nothing we use
    while parser.peek() == Some(b'^') {
        parser.pos += 1;
        parser.reference_type()?;
    }
    parser.finish()?;
    Ok(MethodSignature {
        type_parameters,
        parameters,
        return_type,
    })
}

/// Parse a class `Signature` attribute
pub fn parse_class_signature(text: &str) -> Result<ClassSignature, SignatureError> {
    let mut parser = SignatureParser::new(text);
    let type_parameters = parser.type_parameters()?;
    let superclass = parser.class_type()?;
    let mut interfaces = Vec::new();
    while parser.peek().is_some() {
        interfaces.push(parser.class_type()?);
    }
    Ok(ClassSignature {
        type_parameters,
        superclass,
        interfaces,
    })
}

/// Parse a single field descriptor or field signature
pub fn parse_field_type(text: &str) -> Result<JavaType, SignatureError> {
    let mut parser = SignatureParser::new(text);
    let ty = parser.java_type()?;
    parser.finish()?;
    Ok(ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_descriptor() {
        let sig = parse_method_signature("(Landroid/os/Bundle;I[J)V").unwrap();
        assert_eq!(sig.parameters.len(), 3);
        assert_eq!(sig.parameters[0].to_string(), "android.os.Bundle");
        assert_eq!(sig.parameters[1].to_string(), "int");
        assert_eq!(sig.parameters[2].to_string(), "long[]");
        assert_eq!(sig.return_type, JavaType::Base('V'));
    }

    #[test]
    fn test_kotlin_default_constructor_descriptor() {
        let sig = parse_method_signature(
            "(Ljava/lang/String;ILkotlin/jvm/internal/DefaultConstructorMarker;)V",
        )
        .unwrap();
        assert_eq!(
            sig.parameters.last().map(|t| t.to_string()).as_deref(),
            Some("kotlin.jvm.internal.DefaultConstructorMarker")
        );
    }

    #[test]
    fn test_class_signature_with_bounds() {
        let sig = parse_class_signature(
            "<T:Ljava/lang/Object;V::Ljava/lang/Runnable;>Landroidx/fragment/app/Fragment;Ljava/lang/Comparable<TT;>;",
        )
        .unwrap();
        assert_eq!(sig.type_parameters.len(), 2);
        assert_eq!(sig.type_parameters[0].name, "T");
        assert!(sig.type_parameters[0].bounds[0].is_object());
        assert_eq!(sig.type_parameters[1].bounds[0].to_string(), "java.lang.Runnable");
        assert_eq!(sig.superclass.to_string(), "androidx.fragment.app.Fragment");
        assert_eq!(sig.interfaces[0].to_string(), "java.lang.Comparable<T>");
    }

    #[test]
    fn test_inner_class_and_wildcards() {
        let ty = parse_field_type("Ljava/util/Map<TK;TV;>.Entry<+Ljava/lang/Number;*>;").unwrap();
        assert_eq!(
            ty.to_string(),
            "java.util.Map.Entry<? extends java.lang.Number, ?>"
        );
    }

    #[test]
    fn test_malformed() {
        let err = parse_method_signature("(Ljava/lang/String").unwrap_err();
        assert_eq!(err.signature, "(Ljava/lang/String");
        assert!(parse_field_type("Q").is_err());
    }

    #[test]
    fn test_name_forms() {
        assert_eq!(internal_to_qualified("a/b/Outer$Inner"), "a.b.Outer.Inner");
        assert_eq!(internal_to_binary("a/b/Outer$Inner"), "a.b.Outer$Inner");
        assert_eq!(binary_to_internal("a.b.Outer$Inner"), "a/b/Outer$Inner");
    }
}
