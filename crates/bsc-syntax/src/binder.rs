//! Populates and links the symbol tables of a freshly built file.

use crate::ast::{BrsFile, BscType, ClassMember, FunctionExpression, Statement, StatementKind};
use crate::symbol_table::SymbolTable;
use crate::walk::{walk_file, walk_function, walk_statement, NodeRef, Visitor, WalkContext};

/// Bind every table of `file`.
///
/// * the file table and namespace tables receive the runtime-visible
///   declarations made directly in them (functions, classes, consts)
/// * namespace tables are parented to the file table
/// * function tables receive `m`, parameters, assignment and for-each targets,
///   and are parented to the innermost enclosing table
pub fn bind_file(file: &BrsFile) {
    let mut binder = Binder { bound: 0 };
    walk_file(&mut binder, file);
    log::trace!("bound {} function tables in {}", binder.bound, file.pkg_path);
}

struct Binder {
    bound: usize,
}

impl Binder {
    fn declare(stmt: &Statement, table: &SymbolTable) {
        match &stmt.kind {
            StatementKind::Function(func) => table.add_symbol(&func.name.text, func.name.range, BscType::Function),
            StatementKind::Class(class) => table.add_symbol(&class.name.text, class.name.range, BscType::Function),
            StatementKind::Const(constant) => {
                table.add_symbol(&constant.name.text, constant.name.range, constant.value.inferred_type())
            }
            _ => {}
        }
    }
}

impl<'a> Visitor<'a> for Binder {
    fn visit_statement(&mut self, stmt: &'a Statement, ctx: &mut WalkContext<'a>) {
        match &stmt.kind {
            StatementKind::Namespace(ns) => {
                ns.symbol_table
                    .push_parent_provider(SymbolTable::provider_for(ctx.symbol_table()));
            }
            StatementKind::Assignment { name, value } => {
                if let Some(func) = ctx.function() {
                    func.symbol_table.add_symbol(&name.text, name.range, value.inferred_type());
                }
            }
            StatementKind::ForEach { item, .. } => {
                if let Some(func) = ctx.function() {
                    func.symbol_table.add_symbol(&item.text, item.range, BscType::Dynamic);
                }
            }
            _ => {}
        }
        if ctx.function().is_none() {
            Self::declare(stmt, ctx.symbol_table());
        }
        walk_statement(self, stmt, ctx)
    }

    fn visit_function(&mut self, func: &'a FunctionExpression, ctx: &mut WalkContext<'a>) {
        let table = &func.symbol_table;
        table.push_parent_provider(SymbolTable::provider_for(ctx.symbol_table()));

        let method_of = match ctx.parent() {
            Some(NodeRef::ClassMember(ClassMember::Method(_))) => ctx.class(),
            _ => None,
        };
        match method_of {
            Some(class) => {
                table.add_symbol("m", class.name.range, BscType::Custom(class.name.text.clone()));
                if let Some(parent) = &class.parent_class {
                    table.add_symbol("super", parent.range, BscType::Custom(parent.text()));
                }
            }
            None => table.add_symbol("m", func.range, BscType::Object),
        }

        for param in &func.parameters {
            table.add_symbol(&param.name.text, param.name.range, param.bsc_type());
        }
        self.bound += 1;
        walk_function(self, func, ctx)
    }
}
