use crate::error::{ExprFamily, SourceLocation, SyntaxError, SyntaxErrorKind};
use charsheet_core::{
    Activation, Amount, AttrValue, Comparator, Effect, EffectOp, EffectTime, Factor, OpKind,
    Operand, OperandSource, Ratio, SCALE,
};

/// Compiles `KEY time op operand`.
pub fn compile_effect(text: &str, location: &SourceLocation) -> Result<Effect, SyntaxError> {
    let mut parser = LineParser::new(ExprFamily::Effect, text, location)?;
    let key = parser.parse_key()?;
    let time = parser.parse_time()?;
    let (kind, source) = parser.parse_operation()?;
    let op = parser.parse_effect_operand(kind, source)?;
    Ok(Effect::new(key, time, op))
}

/// Compiles `KEY cmp operand`.
pub fn compile_activation(
    text: &str,
    location: &SourceLocation,
) -> Result<Activation, SyntaxError> {
    let mut parser = LineParser::new(ExprFamily::Activation, text, location)?;
    let key = parser.parse_key()?;
    let cmp = parser.parse_comparator()?;
    let operand = parser.parse_activation_operand()?;
    Ok(Activation::new(key, cmp, operand))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Word<'a> {
    text: &'a str,
    column: usize,
}

/// Both grammars are exactly four single-space separated words.
const WORD_COUNT: usize = 4;

fn split_words(text: &str) -> Result<Vec<Word<'_>>, (usize, SyntaxErrorKind)> {
    let mut words = Vec::new();
    let mut column = 1;
    for piece in text.split(' ') {
        if piece.is_empty() {
            return Err((column, SyntaxErrorKind::EmptyToken));
        }
        words.push(Word {
            text: piece,
            column,
        });
        column += piece.chars().count() + 1;
    }
    if words.len() != WORD_COUNT {
        let column = words.get(WORD_COUNT).map(|word| word.column).unwrap_or(1);
        return Err((column, SyntaxErrorKind::WrongTokenCount(words.len())));
    }
    Ok(words)
}

struct LineParser<'a> {
    family: ExprFamily,
    text: &'a str,
    location: &'a SourceLocation,
    words: Vec<Word<'a>>,
    pos: usize,
}

impl<'a> LineParser<'a> {
    fn new(
        family: ExprFamily,
        text: &'a str,
        location: &'a SourceLocation,
    ) -> Result<Self, SyntaxError> {
        let words = split_words(text).map_err(|(column, reason)| SyntaxError {
            family,
            text: text.to_string(),
            location: location.clone(),
            column,
            reason,
        })?;
        Ok(Self {
            family,
            text,
            location,
            words,
            pos: 0,
        })
    }

    fn next_word(&mut self) -> Word<'a> {
        // split_words guarantees exactly WORD_COUNT words and every grammar
        // consumes exactly that many.
        let word = self.words[self.pos];
        self.pos += 1;
        word
    }

    fn error(&self, word: Word<'_>, reason: SyntaxErrorKind) -> SyntaxError {
        SyntaxError {
            family: self.family,
            text: self.text.to_string(),
            location: self.location.clone(),
            column: word.column,
            reason,
        }
    }

    fn parse_key(&mut self) -> Result<String, SyntaxError> {
        let word = self.next_word();
        self.key_from(word)
    }

    fn key_from(&self, word: Word<'_>) -> Result<String, SyntaxError> {
        if is_key(word.text) {
            Ok(word.text.to_string())
        } else {
            Err(self.error(word, SyntaxErrorKind::InvalidKey(word.text.to_string())))
        }
    }

    fn parse_time(&mut self) -> Result<EffectTime, SyntaxError> {
        let word = self.next_word();
        EffectTime::from_keyword(word.text)
            .ok_or_else(|| self.error(word, SyntaxErrorKind::UnknownTime(word.text.to_string())))
    }

    fn parse_operation(&mut self) -> Result<(OpKind, OperandSource), SyntaxError> {
        let word = self.next_word();
        let (base, source) = if let Some(base) = word.text.strip_suffix("Other") {
            (base, OperandSource::Attribute)
        } else if let Some(base) = word.text.strip_suffix("Const") {
            (base, OperandSource::Constant)
        } else {
            (word.text, OperandSource::Literal)
        };
        let kind = OpKind::from_keyword(base).ok_or_else(|| {
            self.error(word, SyntaxErrorKind::UnknownOperation(word.text.to_string()))
        })?;
        Ok((kind, source))
    }

    fn parse_effect_operand(
        &mut self,
        kind: OpKind,
        source: OperandSource,
    ) -> Result<EffectOp, SyntaxError> {
        let word = self.next_word();
        if kind.is_multiplicative() {
            let factor = match source {
                OperandSource::Literal => {
                    Factor::Ratio(Ratio::from_hundredths(self.number_from(word)?))
                }
                OperandSource::Attribute => Factor::Attribute(self.key_from(word)?),
                OperandSource::Constant => Factor::Constant(self.key_from(word)?),
            };
            return Ok(match kind {
                OpKind::Mult => EffectOp::Mult(factor),
                _ => EffectOp::Div(factor),
            });
        }
        let amount = match source {
            OperandSource::Literal => Amount::Literal(self.number_from(word)?),
            OperandSource::Attribute => Amount::Attribute(self.key_from(word)?),
            OperandSource::Constant => Amount::Constant(self.key_from(word)?),
        };
        Ok(match kind {
            OpKind::Add => EffectOp::Add(amount),
            OpKind::Set => EffectOp::Set(amount),
            OpKind::Max => EffectOp::Max(amount),
            _ => EffectOp::Min(amount),
        })
    }

    fn parse_comparator(&mut self) -> Result<Comparator, SyntaxError> {
        let word = self.next_word();
        Comparator::from_symbol(word.text).ok_or_else(|| {
            self.error(word, SyntaxErrorKind::UnknownComparator(word.text.to_string()))
        })
    }

    fn parse_activation_operand(&mut self) -> Result<Operand, SyntaxError> {
        let word = self.next_word();
        match word.text {
            "true" => return Ok(Operand::Bool(true)),
            "false" => return Ok(Operand::Bool(false)),
            _ => {}
        }
        if is_key(word.text) {
            return Ok(Operand::Ident(word.text.to_string()));
        }
        match parse_hundredths(word.text) {
            Ok(value) => Ok(Operand::Number(value)),
            Err(SyntaxErrorKind::NumberOutOfRange(text)) => {
                Err(self.error(word, SyntaxErrorKind::NumberOutOfRange(text)))
            }
            Err(_) => Err(self.error(word, SyntaxErrorKind::InvalidOperand(word.text.to_string()))),
        }
    }

    fn number_from(&self, word: Word<'_>) -> Result<AttrValue, SyntaxError> {
        parse_hundredths(word.text).map_err(|reason| self.error(word, reason))
    }
}

/// `UPPER (UPPER | DIGIT | '_')*`
fn is_key(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {
            chars.all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == '_')
        }
        _ => false,
    }
}

/// Parses `["-"] DIGIT+ ["." DIGIT{1,2}]` exactly into hundredths.
fn parse_hundredths(text: &str) -> Result<AttrValue, SyntaxErrorKind> {
    let invalid = || SyntaxErrorKind::InvalidNumber(text.to_string());
    let out_of_range = || SyntaxErrorKind::NumberOutOfRange(text.to_string());
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (whole, frac) = match body.split_once('.') {
        Some((whole, frac)) => (whole, Some(frac)),
        None => (body, None),
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let frac_value = match frac {
        None => 0,
        Some(digits)
            if (1..=2).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit()) =>
        {
            let value: AttrValue = digits.parse().map_err(|_| invalid())?;
            if digits.len() == 1 {
                value * 10
            } else {
                value
            }
        }
        Some(_) => return Err(invalid()),
    };
    let whole_value: AttrValue = whole.parse().map_err(|_| out_of_range())?;
    let magnitude = whole_value
        .checked_mul(SCALE)
        .and_then(|value| value.checked_add(frac_value))
        .ok_or_else(out_of_range)?;
    Ok(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn here() -> SourceLocation {
        SourceLocation::file("features.json").with_field("effects[0]")
    }

    fn effect(text: &str) -> Effect {
        compile_effect(text, &here()).expect("compile effect")
    }

    fn reason(text: &str) -> (usize, SyntaxErrorKind) {
        let err = compile_effect(text, &here()).expect_err("must not compile");
        (err.column, err.reason)
    }

    macro_rules! literal_case {
        ($name:ident, $text:expr, $expected:expr) => {
            #[test]
            fn $name() {
                assert_eq!(effect($text).op, $expected);
            }
        };
    }

    literal_case!(add_whole, "MAXHP normal add 2", EffectOp::Add(Amount::Literal(200)));
    literal_case!(add_negative, "AC late add -1", EffectOp::Add(Amount::Literal(-100)));
    literal_case!(set_one_decimal, "SPEED early set 7.5", EffectOp::Set(Amount::Literal(750)));
    literal_case!(max_two_decimals, "STR latest max 19.25", EffectOp::Max(Amount::Literal(1925)));
    literal_case!(min_negative_fraction, "AC latest min -0.05", EffectOp::Min(Amount::Literal(-5)));
    literal_case!(
        mult_unscaled,
        "STR earliest mult 1.25",
        EffectOp::Mult(Factor::Ratio(Ratio::new(5, 4)))
    );
    literal_case!(
        mult_whole,
        "MAXHP late mult -1",
        EffectOp::Mult(Factor::Ratio(Ratio::whole(-1)))
    );
    literal_case!(
        div_unscaled,
        "MAXHP early div -4",
        EffectOp::Div(Factor::Ratio(Ratio::whole(-4)))
    );
    literal_case!(div_half, "SPEED normal div 0.5", EffectOp::Div(Factor::Ratio(Ratio::new(1, 2))));
    literal_case!(
        add_other,
        "AC normal addOther DEXMOD",
        EffectOp::Add(Amount::Attribute("DEXMOD".into()))
    );
    literal_case!(
        set_const,
        "MAXHP earliest setConst CONST2",
        EffectOp::Set(Amount::Constant("CONST2".into()))
    );
    literal_case!(
        mult_other,
        "MAXHP late multOther STR",
        EffectOp::Mult(Factor::Attribute("STR".into()))
    );
    literal_case!(
        div_const,
        "MAXHP late divConst LEVEL",
        EffectOp::Div(Factor::Constant("LEVEL".into()))
    );
    literal_case!(
        max_other,
        "AC latest maxOther DEXMOD",
        EffectOp::Max(Amount::Attribute("DEXMOD".into()))
    );
    literal_case!(
        min_const,
        "STR latest minConst STR_CAP",
        EffectOp::Min(Amount::Constant("STR_CAP".into()))
    );

    #[test]
    fn effect_fields() {
        let compiled = effect("MAXHP latest addConst LEVEL");
        assert_eq!(compiled.key, "MAXHP");
        assert_eq!(compiled.time, EffectTime::Latest);
    }

    #[test]
    fn additive_literals_scale_and_multiplicative_do_not() {
        let literals = [("0", 0), ("3", 300), ("1.5", 150), ("-2.25", -225), ("10.05", 1005)];
        for (text, hundredths) in literals {
            assert_eq!(
                effect(&format!("MAXHP normal add {text}")).op,
                EffectOp::Add(Amount::Literal(hundredths))
            );
            assert_eq!(
                effect(&format!("MAXHP normal mult {text}")).op,
                EffectOp::Mult(Factor::Ratio(Ratio::from_hundredths(hundredths)))
            );
        }
    }

    #[test]
    fn printed_effects_compile_back() {
        for text in [
            "MAXHP normal add 2",
            "STR earliest mult 1.25",
            "MAXHP earliest setConst CONST2",
            "MAXHP late multOther STR",
            "AC latest min -0.5",
        ] {
            assert_eq!(effect(text).to_string(), text);
        }
    }

    #[test]
    fn activations() {
        let level = compile_activation("LEVEL == 5", &here()).expect("compile");
        assert_eq!(level, Activation::new("LEVEL", Comparator::Eq, Operand::Number(500)));
        let armor = compile_activation("ARMOR_ON == true", &here()).expect("compile");
        assert_eq!(armor.operand, Operand::Bool(true));
        let shield = compile_activation("SHIELD != false", &here()).expect("compile");
        assert_eq!(shield.cmp, Comparator::Ne);
        let versus = compile_activation("STR >= DEX", &here()).expect("compile");
        assert_eq!(versus.operand, Operand::Ident("DEX".into()));
        let comparators = [(">", Comparator::Gt), ("<", Comparator::Lt), ("<=", Comparator::Le)];
        for (symbol, cmp) in comparators {
            let compiled = compile_activation(&format!("CLASS_LEVEL {symbol} 3.5"), &here())
                .expect("compile");
            assert_eq!(compiled.cmp, cmp);
            assert_eq!(compiled.operand, Operand::Number(350));
        }
    }

    #[test]
    fn rejects_malformed_effects() {
        assert_eq!(reason("MAXHP normal add"), (1, SyntaxErrorKind::WrongTokenCount(3)));
        assert_eq!(reason("MAXHP normal add 2 3"), (20, SyntaxErrorKind::WrongTokenCount(5)));
        assert_eq!(reason("MAXHP  normal add 2"), (7, SyntaxErrorKind::EmptyToken));
        assert_eq!(reason(""), (1, SyntaxErrorKind::EmptyToken));
        assert_eq!(reason("maxhp normal add 2"), (1, SyntaxErrorKind::InvalidKey("maxhp".into())));
        assert_eq!(reason("1HP normal add 2"), (1, SyntaxErrorKind::InvalidKey("1HP".into())));
        assert_eq!(
            reason("MAXHP sometime add 2"),
            (7, SyntaxErrorKind::UnknownTime("sometime".into()))
        );
        assert_eq!(
            reason("MAXHP Normal add 2"),
            (7, SyntaxErrorKind::UnknownTime("Normal".into()))
        );
        assert_eq!(
            reason("MAXHP normal plus 2"),
            (14, SyntaxErrorKind::UnknownOperation("plus".into()))
        );
        assert_eq!(
            reason("MAXHP normal addother STR"),
            (14, SyntaxErrorKind::UnknownOperation("addother".into()))
        );
        assert_eq!(
            reason("MAXHP normal add 1.234"),
            (18, SyntaxErrorKind::InvalidNumber("1.234".into()))
        );
        assert_eq!(
            reason("MAXHP normal add .5"),
            (18, SyntaxErrorKind::InvalidNumber(".5".into()))
        );
        assert_eq!(
            reason("MAXHP normal add 2."),
            (18, SyntaxErrorKind::InvalidNumber("2.".into()))
        );
        assert_eq!(
            reason("MAXHP normal add +2"),
            (18, SyntaxErrorKind::InvalidNumber("+2".into()))
        );
        assert_eq!(
            reason("MAXHP normal add STR"),
            (18, SyntaxErrorKind::InvalidNumber("STR".into()))
        );
        assert_eq!(
            reason("MAXHP normal addOther 2"),
            (23, SyntaxErrorKind::InvalidKey("2".into()))
        );
        assert_eq!(
            reason("MAXHP normal add 99999999999999999999"),
            (18, SyntaxErrorKind::NumberOutOfRange("99999999999999999999".into()))
        );
    }

    #[test]
    fn rejects_malformed_activations() {
        let err = compile_activation("LEVEL = 5", &here()).expect_err("bad comparator");
        assert_eq!(err.reason, SyntaxErrorKind::UnknownComparator("=".into()));
        assert_eq!(err.column, 7);
        let err = compile_activation("LEVEL == five", &here()).expect_err("bad operand");
        assert_eq!(err.reason, SyntaxErrorKind::InvalidOperand("five".into()));
        let err = compile_activation("LEVEL == True", &here()).expect_err("case sensitive");
        assert_eq!(err.reason, SyntaxErrorKind::InvalidOperand("True".into()));
        let err = compile_activation("LEVEL==5", &here()).expect_err("needs spaces");
        assert_eq!(err.reason, SyntaxErrorKind::WrongTokenCount(1));
    }

    #[test]
    fn error_message_names_file_and_text() {
        let err = compile_effect("MAXHP normal plus 2", &here()).expect_err("must fail");
        assert_eq!(err.family, ExprFamily::Effect);
        assert_eq!(
            err.to_string(),
            "features.json (effects[0]): invalid effect 'MAXHP normal plus 2' at column 14: \
             unknown operation 'plus'"
        );
    }
}
