use crate::{
    common::{
        chunk::{Bytecode, Chunk, Module},
        opcode::Opcode,
    },
    compiler::{
        ast::{Block, Expr, Func, Node, Return, Value},
        error::Error,
        token::Token,
    },
};

/// Compiler is a bytecode generator that walks an AST and produces
/// stack-machine bytecode, one `Chunk` per function.
#[derive(Debug)]
pub struct Compiler {
    chunk: Chunk,
}

impl Compiler {
    /// Lowers a `Root` node into a `Module` named `main`.
    /// The tree is only read, never modified,
    /// so the same tree always yields the same module.
    pub fn generate(root: &Node) -> Result<Module, Error> {
        let decls = match root {
            Node::Root(root) => &root.decls,
            other => {
                return Err(Error::generation(&format!(
                    "Expected a root node, found {}",
                    other.kind()
                )))
            },
        };

        log::debug!("generating bytecode for {} declarations", decls.len());
        let mut module = Module::new("main");

        for decl in decls.iter() {
            match decl {
                Node::Func(func) => module.push(Compiler::func(func)?),
                other => {
                    return Err(Error::generation(&format!(
                        "Only function declarations can be lowered at the top level, found {}",
                        other.kind()
                    )))
                },
            }
        }

        log::debug!("generated {} chunks", module.chunks().len());
        Ok(module)
    }

    /// Compiles a function declaration into its own chunk,
    /// named after the function.
    pub fn func(func: &Func) -> Result<Chunk, Error> {
        let mut compiler = Compiler {
            chunk: Chunk::new(&func.name),
        };
        compiler.block(&func.body)?;
        Ok(compiler.chunk)
    }

    /// Walks a statement, dispatching on its kind.
    fn walk(&mut self, node: &Node) -> Result<(), Error> {
        match node {
            Node::Return(ret) => self.ret(ret),
            other => Err(Error::generation(&format!(
                "Statements of this kind can not be lowered yet: found {}",
                other.kind()
            ))),
        }
    }

    /// Statements are lowered in order, back to back.
    fn block(&mut self, block: &Block) -> Result<(), Error> {
        for stmt in block.stmts.iter() {
            self.walk(stmt)?;
        }
        Ok(())
    }

    fn ret(&mut self, ret: &Return) -> Result<(), Error> {
        self.expression(&ret.expr)?;
        self.chunk.emit(Bytecode::new(Opcode::Ret));
        Ok(())
    }

    /// Post-order: left operand, right operand, then the operator
    /// that combines them.
    fn expression(&mut self, expr: &Expr) -> Result<(), Error> {
        self.operand(&expr.left)?;

        match (expr.op, &expr.right) {
            (Some(op), Some(right)) => {
                self.operand(right)?;
                self.operator(op)
            },
            // a bare operand, like the `4` in `return 4;`
            (None, None) => Ok(()),
            (Some(op), None) => Err(Error::generation(&format!(
                "Operator {} is missing its right operand",
                op.kind
            ))),
            (None, Some(_)) => Err(Error::generation(
                "Expression has a right operand but no operator",
            )),
        }
    }

    fn operand(&mut self, node: &Node) -> Result<(), Error> {
        match node {
            Node::Value(value) => {
                self.value(*value);
                Ok(())
            },
            Node::Expr(expr) => self.expression(expr),
            other => Err(Error::generation(&format!(
                "Expected an operand, found {}",
                other.kind()
            ))),
        }
    }

    /// Takes a `Value` leaf and produces the code to push the constant.
    fn value(&mut self, Value(value): Value) {
        self.chunk.emit(Bytecode::constant(value));
    }

    fn operator(&mut self, op: Token) -> Result<(), Error> {
        match Opcode::from_operator(op.kind) {
            Opcode::Nil => Err(Error::generation(&format!(
                "Operator {} has no bytecode lowering",
                op.kind
            ))),
            opcode => {
                self.chunk.emit(Bytecode::new(opcode));
                Ok(())
            },
        }
    }
}

#[cfg(test)]
mod test {
    use std::rc::Rc;

    use super::*;
    use crate::{
        common::source::Source,
        compiler::{
            ast::Root,
            error::ErrorKind,
            lex::Lexer,
            parse::Parser,
            token::TokenType,
        },
    };

    fn generate(source: &str) -> Result<Module, Error> {
        let source = Source::source(source);
        let tokens = Lexer::lex(Rc::clone(&source))?;
        let root = Parser::parse(source, tokens)?;
        Compiler::generate(&root)
    }

    fn opcodes(chunk: &Chunk) -> Vec<Opcode> {
        chunk.instructions().iter().map(|b| b.opcode).collect()
    }

    #[test]
    fn constant() {
        let module = generate("func f() { return 4; }").unwrap();
        assert_eq!(module.name(), "main");
        assert_eq!(module.chunks().len(), 1);

        let chunk = &module.chunks()[0];
        assert_eq!(chunk.name(), "f");
        assert_eq!(
            chunk.instructions(),
            &[Bytecode::constant(4.0), Bytecode::new(Opcode::Ret)]
        );
    }

    #[test]
    fn params() {
        let module = generate("func add(a, b) { return 4; }").unwrap();
        let chunk = module.chunk("add").unwrap();
        assert_eq!(chunk.len(), 2);
    }

    #[test]
    fn post_order() {
        let module = generate("func f() { return 1 + 2 * 3; }").unwrap();
        let chunk = module.chunk("f").unwrap();
        assert_eq!(
            chunk.instructions(),
            &[
                Bytecode::constant(1.0),
                Bytecode::constant(2.0),
                Bytecode::constant(3.0),
                Bytecode::new(Opcode::Mul),
                Bytecode::new(Opcode::Add),
                Bytecode::new(Opcode::Ret),
            ]
        );
    }

    #[test]
    fn operators() {
        let module = generate("func f() { return (8 - 2) / 3; }").unwrap();
        assert_eq!(
            opcodes(&module.chunks()[0]),
            vec![
                Opcode::StoreConst,
                Opcode::StoreConst,
                Opcode::Sub,
                Opcode::StoreConst,
                Opcode::Div,
                Opcode::Ret,
            ]
        );
    }

    #[test]
    fn statement_order() {
        let module = generate("func f() { return 1; return 2; }").unwrap();
        assert_eq!(
            module.chunks()[0].instructions(),
            &[
                Bytecode::constant(1.0),
                Bytecode::new(Opcode::Ret),
                Bytecode::constant(2.0),
                Bytecode::new(Opcode::Ret),
            ]
        );
    }

    #[test]
    fn chunk_order() {
        let module = generate("func b() { return 1; } func a() { return 2; }").unwrap();
        let names: Vec<&str> = module.chunks().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn empty() {
        let module = generate("").unwrap();
        assert!(module.chunks().is_empty());

        let module = generate("func f() {}").unwrap();
        assert!(module.chunks()[0].is_empty());
    }

    #[test]
    fn not_root() {
        let error = Compiler::generate(&Node::Value(Value(4.0))).unwrap_err();
        assert_eq!(error.kind, ErrorKind::Generation);
        assert!(error.notes.is_empty());
    }

    #[test]
    fn unlowered_operator() {
        let error = generate("func f() { return 1 == 2; }").unwrap_err();
        assert_eq!(error.kind, ErrorKind::Generation);
        assert!(error.reason.contains("`==`"));
    }

    #[test]
    fn unlowered_decl() {
        let root = Node::Root(Root {
            decls: vec![Node::Value(Value(1.0))],
        });
        assert_eq!(
            Compiler::generate(&root).unwrap_err().kind,
            ErrorKind::Generation
        );
    }

    #[test]
    fn unlowered_statement() {
        let func = Func {
            name: "f".to_string(),
            params: vec![],
            body: Block {
                stmts: vec![Node::Value(Value(1.0))],
            },
        };
        assert_eq!(Compiler::func(&func).unwrap_err().kind, ErrorKind::Generation);
    }

    #[test]
    fn malformed_expr() {
        let plus = Token::new(TokenType::Plus, 0, 1);
        let expr = Expr {
            op: Some(plus),
            left: Box::new(Node::Value(Value(1.0))),
            right: None,
        };
        let func = Func {
            name: "f".to_string(),
            params: vec![],
            body: Block {
                stmts: vec![Node::Return(Return { expr })],
            },
        };
        assert!(Compiler::func(&func).is_err());
    }

    fn returning(expr: &str) -> String {
        format!("func f() {{ return {}; }}", expr)
    }

    #[test]
    fn long_chains_fail_cleanly() {
        for op in ["+", " * ", " - "] {
            let source = returning(&vec!["1"; 100_000].join(op));
            let error = generate(&source).unwrap_err();
            assert_eq!(error.kind, ErrorKind::Parsing, "{}", op);
        }

        let source = returning(&format!("{}1", "(1 + 2) * 3 / ".repeat(10_000)));
        assert_eq!(generate(&source).unwrap_err().kind, ErrorKind::Parsing);
    }

    #[test]
    fn chain_at_limit() {
        let source = returning(&vec!["1"; 257].join(" + "));
        let module = generate(&source).unwrap();
        let chunk = &module.chunks()[0];

        // 257 constants, 256 adds, one return
        assert_eq!(chunk.len(), 514);
        assert_eq!(chunk.instructions()[513], Bytecode::new(Opcode::Ret));
    }

    #[test]
    fn deterministic() {
        let source = "func f() { return 1 + 2 * 3; } func g(x) { return (4 - 1) / 2; }";
        let first = generate(source).unwrap();
        let second = generate(source).unwrap();
        assert_eq!(first, second);

        let encode = |m: &Module| m.chunks().iter().map(Chunk::encode).collect::<Vec<_>>();
        assert_eq!(encode(&first), encode(&second));
    }

    proptest::proptest! {
        #[test]
        fn generation_is_deterministic(
            numbers in proptest::collection::vec(0u32..1000, 1..8),
            ops in proptest::collection::vec(proptest::sample::select(vec!["+", "-", "*", "/"]), 7),
        ) {
            let mut expr = numbers[0].to_string();
            for (number, op) in numbers[1..].iter().zip(ops.iter()) {
                expr = format!("{} {} {}", expr, op, number);
            }
            let source = format!("func f() {{ return {}; }}", expr);

            let first = generate(&source).unwrap();
            let second = generate(&source).unwrap();
            proptest::prop_assert_eq!(&first, &second);

            // n constants, n - 1 operators, one return
            proptest::prop_assert_eq!(first.chunks()[0].len(), numbers.len() * 2);
        }
    }
}
